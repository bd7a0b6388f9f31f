//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// InvoiceMail - invoicing request emails from timesheet exports
///
/// Reads a timesheet CSV, keeps the rows of one employment status, groups
/// them per consultant and project, and writes one email per consultant.
///
/// Examples:
///   invoicemail timesheet.csv
///   invoicemail timesheet.csv --company ACME --no-ids
///   invoicemail timesheet.csv --english "De Castro Abreu, Silvia" --stdout
///   invoicemail timesheet.csv --format json --output-dir out
///   invoicemail timesheet.csv --dry-run
///   invoicemail --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Timesheet CSV export to process
    #[arg(value_name = "CSV", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Directory the email files are written to
    ///
    /// Defaults to "emails" or the value in .invoicemail.toml.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Company name used in the email subject
    #[arg(long, value_name = "NAME", env = "INVOICEMAIL_COMPANY")]
    pub company: Option<String>,

    /// Leave internal IDs out of the emails
    #[arg(long)]
    pub no_ids: bool,

    /// Employment status whose rows are invoiced (default: AFNM)
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    /// Consultant (exact name) who gets the English template
    ///
    /// Repeat the flag for several consultants.
    #[arg(long, value_name = "NAME")]
    pub english: Option<Vec<String>>,

    /// Billing month (1-12); inferred from the dates when omitted
    #[arg(long, value_name = "MONTH")]
    pub month: Option<u32>,

    /// Year shown in the emails; inferred from the dates when omitted
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .invoicemail.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Print all emails to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: parse and group the CSV, print a summary, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .invoicemail.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the generated emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One .txt file per consultant plus a combined file (default)
    #[default]
    Text,
    /// A single JSON document with every email
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            None => return Err("An input CSV file is required".to_string()),
            _ => {}
        }

        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err("Month must be between 1 and 12".to_string());
            }
        }

        if let Some(ref status) = self.status {
            if status.trim().is_empty() {
                return Err("Status must not be empty".to_string());
            }
        }

        if let Some(ref output_dir) = self.output_dir {
            if output_dir.is_file() {
                return Err(format!(
                    "Output path is a file, not a directory: {}",
                    output_dir.display()
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
