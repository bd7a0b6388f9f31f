//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.invoicemail.toml` files.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".invoicemail.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Email content settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Template language settings.
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Extra or overridden project display names (code = "Name").
    #[serde(default)]
    pub projects: IndexMap<String, String>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the email files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Employment status whose rows are invoiced.
    #[serde(default = "default_employee_status")]
    pub employee_status: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            employee_status: default_employee_status(),
        }
    }
}

fn default_output_dir() -> String {
    "emails".to_string()
}

fn default_employee_status() -> String {
    "AFNM".to_string()
}

/// Email content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Company name shown in the subject.
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// List internal identifiers under each project.
    #[serde(default = "default_true")]
    pub include_ids: bool,

    /// Where consultants upload their invoices.
    #[serde(default = "default_support_form_url")]
    pub support_form_url: String,

    /// Month used when no record date can be parsed (1-12).
    #[serde(default = "default_fallback_month")]
    pub fallback_month: u32,

    /// Year shown in the emails. Inferred from the dates when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            include_ids: true,
            support_form_url: default_support_form_url(),
            fallback_month: default_fallback_month(),
            year: None,
        }
    }
}

fn default_company_name() -> String {
    "EMPRESA".to_string()
}

fn default_true() -> bool {
    true
}

fn default_support_form_url() -> String {
    "https://form.jotform.com/243515805505656".to_string()
}

fn default_fallback_month() -> u32 {
    crate::period::DEFAULT_MONTH
}

/// Template language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Consultants (exact names) who receive the English template.
    #[serde(default = "default_alternate")]
    pub alternate: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            alternate: default_alternate(),
        }
    }
}

fn default_alternate() -> Vec<String> {
    vec!["De Castro Abreu, Silvia".to_string()]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from an optional location such as
    /// [`CONFIG_FILE_NAME`] in the working directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values serde cannot constrain.
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.email.fallback_month) {
            anyhow::bail!(
                "fallback_month must be between 1 and 12, got {}",
                self.email.fallback_month
            );
        }
        if self.general.employee_status.trim().is_empty() {
            anyhow::bail!("employee_status must not be empty");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.display().to_string();
        }
        if let Some(ref status) = args.status {
            self.general.employee_status = status.clone();
        }
        if let Some(ref company) = args.company {
            self.email.company_name = company.clone();
        }
        if args.no_ids {
            self.email.include_ids = false;
        }
        if let Some(year) = args.year {
            self.email.year = Some(year);
        }

        // Names given on the command line extend the configured list
        if let Some(ref names) = args.english {
            for name in names {
                if !self.locale.alternate.contains(name) {
                    self.locale.alternate.push(name.clone());
                }
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.projects.insert(
            "MER000000000-EXAMPLE".to_string(),
            "Example Project".to_string(),
        );
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
