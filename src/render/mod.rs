//! Email rendering.
//!
//! Turns one consultant's ledger into the subject and plain-text body of an
//! invoicing request, in one of two fixed templates.

pub mod directory;
pub mod email;
pub mod locale;

pub use directory::ProjectDirectory;
pub use email::*;
pub use locale::NameAllowlist;
