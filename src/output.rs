//! Writing rendered emails to disk.
//!
//! Text output is one `.txt` file per consultant plus a combined file;
//! JSON output is a single document with every email.

use crate::models::Email;
use crate::period::Period;
use crate::render::{bundle, bundle_stem, email_file_name};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files produced by a text export.
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    /// One file per email, in email order.
    pub emails: Vec<PathBuf>,
    /// The combined file.
    pub bundle: PathBuf,
}

/// One email in the JSON export.
#[derive(Debug, Serialize)]
pub struct ExportedEmail<'a> {
    #[serde(flatten)]
    pub email: &'a Email,
    pub file_name: String,
}

/// The JSON export document.
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub period: Period,
    pub month: &'static str,
    pub company: &'a str,
    pub emails: Vec<ExportedEmail<'a>>,
}

impl<'a> Export<'a> {
    pub fn new(emails: &'a [Email], period: Period, company: &'a str) -> Self {
        let emails = emails
            .iter()
            .zip(unique_file_names(emails, period))
            .map(|(email, file_name)| ExportedEmail { email, file_name })
            .collect();

        Self {
            period,
            month: period.display_name(),
            company,
            emails,
        }
    }
}

/// File names for every email, made unique by appending `_2`, `_3`, ...
pub fn unique_file_names(emails: &[Email], period: Period) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();

    emails
        .iter()
        .map(|email| {
            let base = email_file_name(email, period);
            let mut candidate = base.clone();
            let mut counter = 2;

            while !seen.insert(candidate.clone()) {
                let stem = base.trim_end_matches(".txt");
                candidate = format!("{}_{}.txt", stem, counter);
                counter += 1;
            }

            candidate
        })
        .collect()
}

/// Write each email and the combined file into `dir`.
pub fn write_text_outputs(
    dir: &Path,
    emails: &[Email],
    period: Period,
    show_progress: bool,
) -> Result<WrittenFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(emails.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut written = Vec::with_capacity(emails.len());
    for (email, file_name) in emails.iter().zip(unique_file_names(emails, period)) {
        let path = dir.join(&file_name);
        std::fs::write(&path, &email.body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());

        if let Some(ref pb) = progress_bar {
            pb.set_message(file_name);
            pb.inc(1);
        }
        written.push(path);
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let bundle_path = dir.join(format!("{}.txt", bundle_stem(period)));
    std::fs::write(&bundle_path, bundle(emails))
        .with_context(|| format!("Failed to write {}", bundle_path.display()))?;
    info!("Wrote {} emails to {}", written.len(), dir.display());

    Ok(WrittenFiles {
        emails: written,
        bundle: bundle_path,
    })
}

/// Generate the JSON export.
pub fn generate_json_export(emails: &[Email], period: Period, company: &str) -> Result<String> {
    let export = Export::new(emails, period, company);
    serde_json::to_string_pretty(&export).map_err(Into::into)
}

/// Write the JSON export into `dir`.
pub fn write_json_output(
    dir: &Path,
    emails: &[Email],
    period: Period,
    company: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let content = generate_json_export(emails, period, company)?;
    let path = dir.join(format!("{}.json", bundle_stem(period)));
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
