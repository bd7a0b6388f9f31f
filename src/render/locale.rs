//! Template selection per consultant.

use crate::models::Locale;
use std::collections::HashSet;

/// Decides which consultants receive the alternate (English) template.
pub trait LocalePolicy {
    /// Whether `consultant` should get the alternate template.
    fn is_alternate(&self, consultant: &str) -> bool;

    /// Resolve the template language for `consultant`.
    fn locale_for(&self, consultant: &str) -> Locale {
        if self.is_alternate(consultant) {
            Locale::English
        } else {
            Locale::Spanish
        }
    }
}

impl<F> LocalePolicy for F
where
    F: Fn(&str) -> bool,
{
    fn is_alternate(&self, consultant: &str) -> bool {
        self(consultant)
    }
}

/// Exact-name allowlist of consultants who get the alternate template.
#[derive(Debug, Clone, Default)]
pub struct NameAllowlist {
    names: HashSet<String>,
}

impl NameAllowlist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl LocalePolicy for NameAllowlist {
    fn is_alternate(&self, consultant: &str) -> bool {
        self.names.contains(consultant)
    }
}

/// Fixed wording of one template.
#[derive(Debug)]
pub struct Template {
    pub project_label: &'static str,
    pub hours_unit: &'static str,
    pub rate_unit: &'static str,
    pub total_label: &'static str,
    pub reminder_heading: &'static str,
    pub upload_instruction: &'static str,
    pub codes_instruction: &'static str,
    pub sign_off: &'static str,
}

const SPANISH: Template = Template {
    project_label: "Proyecto",
    hours_unit: "horas",
    rate_unit: "hora",
    total_label: "TOTAL A FACTURAR",
    reminder_heading: "Por favor recuerda:",
    upload_instruction: "Subir tu factura al formulario de AFN Support:",
    codes_instruction: "Incluir los códigos de proyecto en tu factura",
    sign_off: "Saludos!",
};

const ENGLISH: Template = Template {
    project_label: "Project",
    hours_unit: "hours",
    rate_unit: "hour",
    total_label: "TOTAL TO INVOICE",
    reminder_heading: "Please remember:",
    upload_instruction: "Upload your invoice to AFN Support form:",
    codes_instruction: "Include the project codes in your invoice",
    sign_off: "Best regards!",
};

impl Locale {
    /// Static wording for this locale.
    pub fn template(self) -> &'static Template {
        match self {
            Locale::Spanish => &SPANISH,
            Locale::English => &ENGLISH,
        }
    }

    /// Opening line addressed to the consultant.
    pub fn greeting(self, first_name: &str) -> String {
        match self {
            Locale::Spanish => format!("Hola {}, ¿cómo estás?", first_name),
            Locale::English => format!("Hi {}, how are you?", first_name),
        }
    }

    /// Sentence introducing the billing details for a month.
    pub fn intro(self, month: &str, year: i32) -> String {
        match self {
            Locale::Spanish => format!(
                "Te envío el detalle para la facturación de {} {}:",
                month, year
            ),
            Locale::English => format!(
                "I hope you're doing well. Here are the details for {} {} invoicing:",
                month, year
            ),
        }
    }
}
