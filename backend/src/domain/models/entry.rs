//! One member's activity row inside a month report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Activity recorded for one member in one month. The id matches the
/// roster member id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemberMonthEntry {
    pub id: String,
    pub name: String,
    pub participated: bool,
    pub auxiliary_pioneer: bool,
    pub regular_pioneer: bool,
    pub bible_studies: u32,
    pub hours_aux: f64,
    pub hours_regular: f64,
}

impl MemberMonthEntry {
    /// Fresh entry with every flag false and every count zero.
    pub fn blank(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build an entry from a loosely shaped document, coercing missing or
    /// malformed fields to zero/false.
    ///
    /// Both the camelCase field names used by clients and the snake_case
    /// storage names are recognised.
    pub fn from_document(id: &str, doc: &Value) -> Self {
        let name = match field(doc, "name", "name") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };

        Self {
            id: id.to_string(),
            name,
            participated: lenient::truthy(field(doc, "participated", "participated")),
            auxiliary_pioneer: lenient::truthy(field(doc, "auxiliaryPioneer", "auxiliary_pioneer")),
            regular_pioneer: lenient::truthy(field(doc, "regularPioneer", "regular_pioneer")),
            bible_studies: lenient::count(field(doc, "bibleStudies", "bible_studies")),
            hours_aux: lenient::number(field(doc, "hoursAux", "hours_aux")),
            hours_regular: lenient::number(field(doc, "hoursRegular", "hours_regular")),
        }
    }

    /// Apply a field-level patch. Fields the patch leaves as `None` keep
    /// their current value.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(participated) = patch.participated {
            self.participated = participated;
        }
        if let Some(aux) = patch.auxiliary_pioneer {
            self.auxiliary_pioneer = aux;
        }
        if let Some(regular) = patch.regular_pioneer {
            self.regular_pioneer = regular;
        }
        if let Some(studies) = patch.bible_studies {
            self.bible_studies = studies;
        }
        if let Some(hours) = patch.hours_aux {
            self.hours_aux = hours;
        }
        if let Some(hours) = patch.hours_regular {
            self.hours_regular = hours;
        }
    }
}

fn field<'a>(doc: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    doc.get(camel).or_else(|| doc.get(snake))
}

/// Field-level update for an entry. Storage writes only the fields set here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub participated: Option<bool>,
    pub auxiliary_pioneer: Option<bool>,
    pub regular_pioneer: Option<bool>,
    pub bible_studies: Option<u32>,
    pub hours_aux: Option<f64>,
    pub hours_regular: Option<f64>,
}

impl EntryPatch {
    /// Patch that touches nothing but the display name.
    pub fn rename(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch changes any recorded activity value.
    pub fn touches_values(&self) -> bool {
        Self {
            name: None,
            ..self.clone()
        } != Self::default()
    }
}
