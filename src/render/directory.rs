//! Project code → display name lookup.

use indexmap::IndexMap;
use std::borrow::Cow;

const BUILTIN_PROJECTS: [(&str, &str); 12] = [
    ("MER286403207-ADNBRA25", "ADN Brasil"),
    ("MER286403208-MER28640", "ADN Argentina"),
    ("MER286403209-ADNCOL25", "ADN Colombia"),
    ("MER286403210-ADNMEX25", "ADN México"),
    ("MER286403211-ADNURU25", "ADN Uruguay"),
    ("MER286403258-CATALAR2", "Leadership Workshops Argentina"),
    ("MER286403267-ADNCHI25", "ADN Chile"),
    ("MER286403269-CATALUR", "Leadership Workshops Uruguay"),
    ("MER286403270-CATALMX", "Leadership Workshops México"),
    ("MER286403271-CATALCO", "Leadership Workshops Colombia"),
    ("MER286403272-CATALCH", "Leadership Workshops Chile"),
    ("MER286403273-CATALBR", "Leadership Workshops Brasil"),
];

/// Read-only mapping from project code to human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirectory {
    names: IndexMap<String, String>,
}

impl Default for ProjectDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProjectDirectory {
    /// Directory with the built-in project names.
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_PROJECTS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Add or replace entries.
    pub fn with_overrides(mut self, overrides: &IndexMap<String, String>) -> Self {
        for (code, name) in overrides {
            self.names.insert(code.clone(), name.clone());
        }
        self
    }

    /// Display name for `code`, or `(code)` when unknown.
    pub fn display_name(&self, code: &str) -> Cow<'_, str> {
        match self.names.get(code) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("({})", code)),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
