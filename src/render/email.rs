//! Invoicing email generation.
//!
//! This module renders the subject and plain-text body of the invoicing
//! request for one consultant, and bundles the emails of a run into a single
//! export.

use crate::models::{ConsultantLedger, Email, Ledger, Locale, ProjectLedger};
use crate::period::Period;
use crate::render::directory::ProjectDirectory;
use crate::render::locale::{LocalePolicy, Template};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Width of the `=` line between emails in the aggregate export.
const BUNDLE_DELIMITER_WIDTH: usize = 60;

/// Caller-supplied rendering settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Company name used in the subject.
    pub company_name: String,
    /// Whether to list each project's internal identifiers.
    pub include_ids: bool,
    /// Form where consultants upload their invoice.
    pub support_form_url: String,
}

/// Renders every consultant of a ledger with shared settings.
pub struct EmailRenderer<'a> {
    directory: &'a ProjectDirectory,
    policy: &'a dyn LocalePolicy,
    options: RenderOptions,
    period: Period,
}

impl<'a> EmailRenderer<'a> {
    pub fn new(
        directory: &'a ProjectDirectory,
        policy: &'a dyn LocalePolicy,
        options: RenderOptions,
        period: Period,
    ) -> Self {
        Self {
            directory,
            policy,
            options,
            period,
        }
    }

    /// Render the email for one consultant.
    pub fn render(&self, consultant: &str, ledger: &ConsultantLedger) -> Email {
        let locale = self.policy.locale_for(consultant);
        render_email(
            consultant,
            ledger,
            self.period,
            locale,
            &self.options,
            self.directory,
        )
    }

    /// Render one email per consultant, in ledger order.
    pub fn render_all(&self, ledger: &Ledger) -> Vec<Email> {
        ledger
            .iter()
            .map(|(consultant, consultant_ledger)| self.render(consultant, consultant_ledger))
            .collect()
    }
}

/// Render the subject and body for one consultant.
pub fn render_email(
    consultant: &str,
    ledger: &ConsultantLedger,
    period: Period,
    locale: Locale,
    options: &RenderOptions,
    directory: &ProjectDirectory,
) -> Email {
    let first_name = first_name(consultant);
    let template = locale.template();
    let month = period.month_name(locale).to_lowercase();

    let subject = format!(
        "{} - Fees {} {} {}",
        options.company_name, month, period.year, first_name
    );

    let mut body = String::new();
    body.push_str(&subject);
    body.push_str("\n\n");
    body.push_str(&locale.greeting(first_name));
    body.push_str("\n\n");
    body.push_str(&locale.intro(&month, period.year));
    body.push_str("\n\n");

    for (code, project) in &ledger.projects {
        body.push_str(&render_project(
            code,
            project,
            template,
            options.include_ids,
            directory,
        ));
    }

    if ledger.has_mixed_currencies() {
        warn!(
            "Projects of {} use different currencies; the total is shown in {}",
            consultant,
            ledger.currency()
        );
    }

    body.push_str(&format!(
        "{}: {} {}\n\n",
        template.total_label,
        ledger.currency(),
        format_money(ledger.grand_total())
    ));
    body.push_str(&render_closing(template, &options.support_form_url));

    debug!("Rendered {} email for {}", locale, consultant);

    Email {
        consultant: consultant.to_string(),
        first_name: first_name.to_string(),
        locale,
        subject,
        body,
    }
}

/// Render the block for a single project.
fn render_project(
    code: &str,
    project: &ProjectLedger,
    template: &Template,
    include_ids: bool,
    directory: &ProjectDirectory,
) -> String {
    let mut block = String::new();

    block.push_str(&format!("{}\n", directory.display_name(code).to_uppercase()));
    block.push_str(&format!("{}: {}\n", template.project_label, code));

    for bucket in project.buckets() {
        block.push_str(&format!(
            "- {}: {} {} @ {} {}/{}\n",
            bucket.activity,
            format_quantity(bucket.hours),
            template.hours_unit,
            bucket.currency,
            format_quantity(bucket.rate),
            template.rate_unit
        ));
    }

    if include_ids {
        block.push_str(&format!("- IDs: {}\n", project.internal_ids.join(", ")));
    }

    block.push_str(&format!(
        "- Subtotal: {} {}\n\n",
        project.currency,
        format_money(project.total_cost)
    ));

    block
}

/// Render the submission instructions and sign-off.
fn render_closing(template: &Template, support_form_url: &str) -> String {
    format!(
        "{}\n- {} {}\n- {}\n\n{}",
        template.reminder_heading,
        template.upload_instruction,
        support_form_url,
        template.codes_instruction,
        template.sign_off
    )
}

/// Extract the first name from `Last, First Middle`.
///
/// Names without a comma, or with nothing after it, are returned verbatim.
pub fn first_name(full_name: &str) -> &str {
    full_name
        .split_once(',')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or(full_name)
}

/// Format a money amount with thousands separators and two decimals.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("{}{}.{}", sign, group_thousands(whole), fraction)
}

/// Insert a comma every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Format hours or a rate without imposing a precision.
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Default file name for one email.
pub fn email_file_name(email: &Email, period: Period) -> String {
    format!(
        "email_{}_{}.txt",
        sanitize_file_component(&email.first_name),
        period.display_name()
    )
}

/// File name of the aggregate export, without extension.
pub fn bundle_stem(period: Period) -> String {
    format!("emails_facturacion_{}", period.display_name().to_lowercase())
}

/// Join every email body with a delimiter line between entries.
pub fn bundle(emails: &[Email]) -> String {
    let delimiter = format!("\n\n{}\n\n", "=".repeat(BUNDLE_DELIMITER_WIDTH));
    emails
        .iter()
        .map(|e| e.body.as_str())
        .collect::<Vec<_>>()
        .join(&delimiter)
}

fn sanitize_file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::aggregate;
    use crate::models::TimesheetRecord;
    use crate::render::locale::NameAllowlist;

    const ANA: &str = "Pérez, Ana";
    const SILVIA: &str = "De Castro Abreu, Silvia";
    const ADN_BRASIL: &str = "MER286403207-ADNBRA25";

    fn record(
        consultant: &str,
        project: &str,
        id: &str,
        rate: i64,
        hours: i64,
        cost: Decimal,
    ) -> TimesheetRecord {
        TimesheetRecord {
            date: None,
            employee_status: "AFNM".to_string(),
            consultant: consultant.to_string(),
            project_code: project.to_string(),
            internal_id: id.to_string(),
            activity: "Facilitation".to_string(),
            rate: Decimal::from(rate),
            hours: Decimal::from(hours),
            cost,
            currency: "USD".to_string(),
        }
    }

    fn options(include_ids: bool) -> RenderOptions {
        RenderOptions {
            company_name: "ACME".to_string(),
            include_ids,
            support_form_url: "https://forms.example/upload".to_string(),
        }
    }

    fn ana_ledger() -> Ledger {
        aggregate(&[
            record(ANA, ADN_BRASIL, "11", 50, 2, Decimal::new(100, 0)),
            record(ANA, ADN_BRASIL, "12", 50, 3, Decimal::new(150, 0)),
            record(ANA, ADN_BRASIL, "13", 60, 1, Decimal::new(6050, 2)),
        ])
    }

    fn render_ana(locale: Locale, include_ids: bool) -> Email {
        let ledger = ana_ledger();
        render_email(
            ANA,
            ledger.get(ANA).unwrap(),
            Period::new(6, 2025),
            locale,
            &options(include_ids),
            &ProjectDirectory::builtin(),
        )
    }

    #[test]
    fn test_spanish_email() {
        let email = render_ana(Locale::Spanish, true);

        assert_eq!(email.subject, "ACME - Fees junio 2025 Ana");
        let expected = "ACME - Fees junio 2025 Ana\n\n\
            Hola Ana, ¿cómo estás?\n\n\
            Te envío el detalle para la facturación de junio 2025:\n\n\
            ADN BRASIL\n\
            Proyecto: MER286403207-ADNBRA25\n\
            - Facilitation: 5 horas @ USD 50/hora\n\
            - Facilitation: 1 horas @ USD 60/hora\n\
            - IDs: 11, 12, 13\n\
            - Subtotal: USD 310.50\n\n\
            TOTAL A FACTURAR: USD 310.50\n\n\
            Por favor recuerda:\n\
            - Subir tu factura al formulario de AFN Support: https://forms.example/upload\n\
            - Incluir los códigos de proyecto en tu factura\n\n\
            Saludos!";
        assert_eq!(email.body, expected);
    }

    #[test]
    fn test_english_email() {
        let email = render_ana(Locale::English, true);

        assert_eq!(email.subject, "ACME - Fees june 2025 Ana");
        assert!(email.body.contains("Hi Ana, how are you?"));
        assert!(email.body.contains("Here are the details for june 2025 invoicing:"));
        assert!(email.body.contains("Project: MER286403207-ADNBRA25\n"));
        assert!(email.body.contains("- Facilitation: 5 hours @ USD 50/hour\n"));
        assert!(email.body.contains("TOTAL TO INVOICE: USD 310.50\n\n"));
        assert!(email.body.ends_with("Best regards!"));
    }

    #[test]
    fn test_totals_identical_across_locales() {
        let spanish = render_ana(Locale::Spanish, true);
        let english = render_ana(Locale::English, true);

        let subtotal = |body: &str| {
            body.lines()
                .filter(|l| l.starts_with("- Subtotal:"))
                .map(String::from)
                .collect::<Vec<_>>()
        };
        assert_eq!(subtotal(&spanish.body), subtotal(&english.body));
        assert!(spanish.body.contains("USD 310.50"));
        assert!(english.body.contains("USD 310.50"));
    }

    #[test]
    fn test_ids_toggle() {
        assert!(render_ana(Locale::Spanish, true).body.contains("- IDs: 11, 12, 13"));
        assert!(!render_ana(Locale::Spanish, false).body.contains("- IDs:"));
    }

    #[test]
    fn test_unknown_project_shows_code() {
        let ledger = aggregate(&[record(ANA, "zz-new", "1", 10, 1, Decimal::ONE)]);
        let email = render_email(
            ANA,
            ledger.get(ANA).unwrap(),
            Period::new(6, 2025),
            Locale::Spanish,
            &options(false),
            &ProjectDirectory::builtin(),
        );
        assert!(email.body.contains("\n(ZZ-NEW)\nProyecto: zz-new\n"));
    }

    #[test]
    fn test_projects_in_ledger_order_with_grand_total() {
        let ledger = aggregate(&[
            record(ANA, "MER286403258-CATALAR2", "1", 10, 1, Decimal::new(100050, 2)),
            record(ANA, ADN_BRASIL, "2", 10, 1, Decimal::new(234450, 2)),
        ]);
        let email = render_email(
            ANA,
            ledger.get(ANA).unwrap(),
            Period::new(6, 2025),
            Locale::Spanish,
            &options(false),
            &ProjectDirectory::builtin(),
        );

        let workshops = email.body.find("LEADERSHIP WORKSHOPS ARGENTINA").unwrap();
        let brasil = email.body.find("ADN BRASIL").unwrap();
        assert!(workshops < brasil);
        assert!(email.body.contains("- Subtotal: USD 1,000.50\n"));
        assert!(email.body.contains("- Subtotal: USD 2,344.50\n"));
        assert!(email.body.contains("TOTAL A FACTURAR: USD 3,345.00\n"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let ledger = ana_ledger();
        let directory = ProjectDirectory::builtin();
        let policy = NameAllowlist::default();
        let renderer = EmailRenderer::new(&directory, &policy, options(true), Period::new(6, 2025));

        let first = renderer.render_all(&ledger);
        let second = renderer.render_all(&ledger);
        assert_eq!(first, second);
    }

    #[test]
    fn test_renderer_uses_policy() {
        let ledger = aggregate(&[
            record(ANA, ADN_BRASIL, "1", 10, 1, Decimal::ONE),
            record(SILVIA, ADN_BRASIL, "2", 10, 1, Decimal::ONE),
        ]);
        let directory = ProjectDirectory::builtin();
        let policy = NameAllowlist::new([SILVIA]);
        let renderer = EmailRenderer::new(&directory, &policy, options(true), Period::new(4, 2025));

        let emails = renderer.render_all(&ledger);
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].locale, Locale::Spanish);
        assert_eq!(emails[0].subject, "ACME - Fees abril 2025 Ana");
        assert_eq!(emails[1].locale, Locale::English);
        assert_eq!(emails[1].subject, "ACME - Fees april 2025 Silvia");
    }

    #[test]
    fn test_first_name() {
        assert_eq!(first_name("Smith, John Robert"), "John");
        assert_eq!(first_name("OnlyOneName"), "OnlyOneName");
        assert_eq!(first_name("Smith,John"), "John");
        assert_eq!(first_name("Smith,   John  "), "John");
        assert_eq!(first_name("Smith, "), "Smith, ");
        assert_eq!(first_name(""), "");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(12345, 1)), "1,234.50");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
        assert_eq!(format_money(Decimal::new(999, 0)), "999.00");
        assert_eq!(format_money(Decimal::new(1234567891, 2)), "12,345,678.91");
        assert_eq!(format_money(Decimal::new(-12345, 1)), "-1,234.50");
        assert_eq!(format_money(Decimal::new(1005, 3)), "1.00");
        assert_eq!(format_money(Decimal::new(1015, 3)), "1.02");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(Decimal::new(500, 2)), "5");
        assert_eq!(format_quantity(Decimal::new(125, 1)), "12.5");
        assert_eq!(format_quantity(Decimal::new(4550, 2)), "45.5");
    }

    #[test]
    fn test_file_names() {
        let email = render_ana(Locale::Spanish, true);
        assert_eq!(email_file_name(&email, Period::new(6, 2025)), "email_Ana_Junio.txt");
        assert_eq!(bundle_stem(Period::new(6, 2025)), "emails_facturacion_junio");

        let odd = Email {
            first_name: "A/B C".to_string(),
            ..email
        };
        assert_eq!(email_file_name(&odd, Period::new(5, 2025)), "email_A_B_C_Mayo.txt");
    }

    #[test]
    fn test_bundle_delimiter() {
        let email = render_ana(Locale::Spanish, false);
        let second = Email {
            body: "second".to_string(),
            ..email.clone()
        };
        let joined = bundle(&[email.clone(), second]);

        let delimiter = format!("\n\n{}\n\n", "=".repeat(60));
        assert_eq!(joined, format!("{}{}second", email.body, delimiter));
        assert_eq!(bundle(&[]), "");
    }
}
