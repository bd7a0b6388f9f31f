//! InvoiceMail - invoicing request emails from timesheet exports
//!
//! A CLI tool that reads a timesheet CSV, groups the billable rows per
//! consultant and project, and renders one invoicing request email per
//! consultant.
//!
//! Exit codes:
//!   0 - Success (including a run where no row matched the status filter)
//!   1 - Error (unreadable file, missing column, bad config, write failure)

mod cli;
mod config;
mod ingest;
mod ledger;
mod models;
mod output;
mod period;
mod render;

use anyhow::{Context, Result};
use chrono::Datelike;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::Email;
use period::Period;
use render::{EmailRenderer, NameAllowlist, ProjectDirectory, RenderOptions};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("InvoiceMail v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .invoicemail.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the company name, English recipients and project names.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the whole pipeline: read, filter, group, render, write.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Keep stdout clean when the emails themselves go there
    let chatty = !args.quiet && !args.stdout;

    let input = args
        .input
        .as_deref()
        .context("An input CSV file is required")?;

    // Step 1: Read the export
    let records = ingest::read_timesheet(input)
        .with_context(|| format!("Failed to load timesheet {}", input.display()))?;
    if chatty {
        println!("📥 Loaded {} rows from {}", records.len(), input.display());
    }

    // Step 2: Work out the billing period from all rows
    let period = resolve_period(&args, &config, &records);
    info!(
        "Billing period: {} {}",
        period.display_name(),
        period.year
    );

    // Step 3: Keep the invoiced status only
    let status = config.general.employee_status.clone();
    let records = ingest::filter_by_status(records, &status);
    if chatty {
        println!(
            "📊 Found {} {} rows for {} {}",
            records.len(),
            status,
            period.display_name(),
            period.year
        );
    }

    // Step 4: Group
    let ledger = ledger::aggregate(&records);
    if ledger.is_empty() {
        warn!("No rows with status {}; nothing to do", status);
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&ledger);
        return Ok(());
    }

    // Step 5: Render
    let directory = ProjectDirectory::builtin().with_overrides(&config.projects);
    let policy = NameAllowlist::new(config.locale.alternate.iter().cloned());
    debug!(
        "{} known projects, {} English recipients",
        directory.len(),
        policy.len()
    );

    let options = RenderOptions {
        company_name: config.email.company_name.clone(),
        include_ids: config.email.include_ids,
        support_form_url: config.email.support_form_url.clone(),
    };
    let renderer = EmailRenderer::new(&directory, &policy, options, period);
    let emails = renderer.render_all(&ledger);

    // Step 6: Emit
    emit(&args, &config, &emails, period)
}

/// Write or print the rendered emails.
fn emit(args: &Args, config: &Config, emails: &[Email], period: Period) -> Result<()> {
    if args.stdout {
        match args.format {
            OutputFormat::Text => println!("{}", render::bundle(emails)),
            OutputFormat::Json => println!(
                "{}",
                output::generate_json_export(emails, period, &config.email.company_name)?
            ),
        }
        return Ok(());
    }

    let dir = Path::new(&config.general.output_dir);
    match args.format {
        OutputFormat::Text => {
            let written = output::write_text_outputs(dir, emails, period, !args.quiet)?;
            if !args.quiet {
                println!("\n📧 Generated {} emails:", emails.len());
                for (email, path) in emails.iter().zip(&written.emails) {
                    println!(
                        "   - {} ({}) → {}",
                        email.first_name,
                        email.locale,
                        path.display()
                    );
                }
                println!(
                    "\n✅ Done! All emails combined in: {}",
                    written.bundle.display()
                );
            }
        }
        OutputFormat::Json => {
            let path =
                output::write_json_output(dir, emails, period, &config.email.company_name)?;
            if !args.quiet {
                println!(
                    "\n✅ Done! {} emails saved to: {}",
                    emails.len(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}

/// Combine explicit overrides with the period inferred from the record dates.
fn resolve_period(args: &Args, config: &Config, records: &[models::TimesheetRecord]) -> Period {
    let fallback_year = config
        .email
        .year
        .unwrap_or_else(|| chrono::Local::now().year());
    let fallback = Period::new(config.email.fallback_month, fallback_year);

    if records.iter().all(|r| r.date.is_none()) {
        debug!("No parseable dates, using fallback period");
    }
    let inferred = period::infer_period(records.iter().map(|r| r.date), fallback);

    Period {
        month: args.month.unwrap_or(inferred.month),
        year: config.email.year.unwrap_or(inferred.year),
    }
}

/// Handle --dry-run: print what would be generated, write nothing.
fn print_dry_run(ledger: &models::Ledger) {
    println!("\n🔍 Dry run: {} emails would be generated\n", ledger.len());

    for summary in ledger::summarize(ledger) {
        println!(
            "   📄 {} - {} project(s), {} h, {} {}",
            summary.consultant,
            summary.projects,
            render::format_quantity(summary.hours),
            summary.currency,
            render::format_money(summary.total)
        );
    }

    println!("\n   Total lines: {}", ledger::line_count(ledger));
    println!("\n✅ Dry run complete. No files were written.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    resolve_config(args.config.as_deref(), Path::new(CONFIG_FILE_NAME))
}

/// An explicit path must load; a broken default file only warns.
fn resolve_config(explicit: Option<&Path>, default_path: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(config_path) = explicit {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_if_exists(default_path) {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", default_path.display());
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
