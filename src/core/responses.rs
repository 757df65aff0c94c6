//! Response normalizer - maps untrusted payer answers onto the live form definition.
//!
//! Payers may send either raw values (`"Ama"`, `25`, `true`) or `{label, value}` echo
//! objects; both are coerced to a string. Every declared field gets an entry in the
//! result whether or not it was answered, so a rejected submission can be re-rendered
//! exactly as sent.

use crate::core::schema::BuilderState;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// One recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// Field label at the time of submission
    pub label: String,
    /// Submitted value as text
    pub value: String,
}

/// Answers keyed by field id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Responses(pub BTreeMap<String, ResponseEntry>);

impl Responses {
    /// Trimmed, non-empty value recorded for a field id.
    #[must_use]
    pub fn trimmed_value(&self, field_id: &str) -> Option<&str> {
        self.0
            .get(field_id)
            .map(|entry| entry.value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Number of recorded answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of [`normalize_responses`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedResponses {
    /// One entry per declared field
    pub responses: Responses,
    /// Labels of blank required fields, in section-then-field order
    pub missing: Vec<String>,
}

/// Prints a number the way a payer typed it: `2025.0` becomes `2025`.
pub(crate) fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.is_finite() => f.to_string(),
        _ => number.to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// Coerces one submitted value to text.
pub(crate) fn coerce(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::Object(echo)) if echo.contains_key("value") => {
            echo.get("value").map(scalar_text).unwrap_or_default()
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(value @ (Value::Array(_) | Value::Object(_))) => value.to_string(),
        Some(Value::Bool(false) | Value::Null) | None => String::new(),
    }
}

/// Normalizes submitted values against the builder's fields.
///
/// When there is no builder state, or it has no sections, both the responses and the
/// missing list are empty and the caller falls back to the legacy identity fields.
/// A required field whose value is blank after trimming is reported by label; this
/// includes required `select` fields that have no options.
#[must_use]
pub fn normalize_responses(state: Option<&BuilderState>, incoming: &Value) -> NormalizedResponses {
    let Some(state) = state.filter(|s| !s.sections.is_empty()) else {
        return NormalizedResponses::default();
    };

    let mut normalized = NormalizedResponses::default();
    for field in state.fields() {
        let value = coerce(incoming.get(&field.id));

        if field.required && value.trim().is_empty() {
            normalized.missing.push(field.label.clone());
        }

        normalized.responses.0.insert(
            field.id.clone(),
            ResponseEntry {
                label: field.label.clone(),
                value,
            },
        );
    }

    normalized
}
