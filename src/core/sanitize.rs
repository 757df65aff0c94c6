//! Builder sanitizer - turns untrusted builder edits into a well-formed [`BuilderState`].
//!
//! Edits arrive as arbitrary JSON. Decoding is total: every malformed value degrades to
//! a documented default instead of failing. The only hard rejection lives in
//! [`apply_builder_edit`], which refuses edits that leave no collectible field.
//!
//! Defaults applied per entry:
//! - section: `id` = `section-{n}`, `title` = `Untitled section`, empty description
//! - field: `id` = `field-{section}-{field}-{millis}`, `label` = `Untitled field`,
//!   `type` = `text` (also for unknown types), `required` = `false`, `width` = `full`
//! - option: `id` = `{fieldId}-option-{n}`, `label` = `Option {n}`, `value` = label
//!
//! Strings count as absent when empty; numbers are stringified.

use crate::{
    core::{
        factory::{StageOverride, build_stage_progress},
        library::{AUTOMATION_OPTIONS, PaymentMethod},
        responses::number_text,
        schema::{
            AutomationToggle, BuilderState, FieldDefinition, FieldOption, FieldType, FieldWidth,
            Gating, HeroSettings, PaymentSettings, Section,
        },
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

const UNTITLED_SECTION: &str = "Untitled section";
const UNTITLED_FIELD: &str = "Untitled field";

/// Reads a value as non-empty text, stringifying numbers.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

fn boolean(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

/// Sanitizes a candidate section list.
///
/// Non-array input yields an empty list; non-object sections, fields and options are
/// dropped. Sanitizing already-sanitized data returns it unchanged.
#[must_use]
pub fn sanitize_sections(candidate: &Value) -> Vec<Section> {
    sanitize_sections_at(candidate, Utc::now().timestamp_millis())
}

/// [`sanitize_sections`] with an explicit timestamp for synthesized field ids.
#[must_use]
pub fn sanitize_sections_at(candidate: &Value, millis: i64) -> Vec<Section> {
    let Some(entries) = candidate.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(section_index, entry)| {
            let section = entry.as_object()?;
            let fields = section
                .get("fields")
                .and_then(Value::as_array)
                .map(|fields| {
                    fields
                        .iter()
                        .enumerate()
                        .filter_map(|(field_index, field)| {
                            sanitize_field(field, section_index, field_index, millis)
                        })
                        .collect()
                })
                .unwrap_or_default();

            Some(Section {
                id: text(section.get("id"))
                    .unwrap_or_else(|| format!("section-{}", section_index + 1)),
                title: text(section.get("title")).unwrap_or_else(|| UNTITLED_SECTION.to_string()),
                description: text(section.get("description")).unwrap_or_default(),
                fields,
            })
        })
        .collect()
}

fn sanitize_field(
    value: &Value,
    section_index: usize,
    field_index: usize,
    millis: i64,
) -> Option<FieldDefinition> {
    let field = value.as_object()?;
    let id = text(field.get("id"))
        .unwrap_or_else(|| format!("field-{section_index}-{field_index}-{millis}"));

    let field_type = field
        .get("type")
        .and_then(Value::as_str)
        .and_then(FieldType::from_name)
        .unwrap_or_default();
    let width = field
        .get("width")
        .and_then(Value::as_str)
        .and_then(FieldWidth::from_name)
        .unwrap_or_default();
    let options = field
        .get("options")
        .and_then(Value::as_array)
        .and_then(|options| sanitize_options(options, &id));

    Some(FieldDefinition {
        label: text(field.get("label")).unwrap_or_else(|| UNTITLED_FIELD.to_string()),
        field_type,
        required: boolean(field.get("required")).unwrap_or(false),
        helper_text: text(field.get("helperText")).unwrap_or_default(),
        placeholder: text(field.get("placeholder")).unwrap_or_default(),
        width,
        options,
        validations: field.get("validations").and_then(Value::as_array).cloned(),
        id,
    })
}

/// Normalizes option entries; an empty result is `None`, never an empty list.
fn sanitize_options(options: &[Value], field_id: &str) -> Option<Vec<FieldOption>> {
    let normalized: Vec<FieldOption> = options
        .iter()
        .enumerate()
        .filter_map(|(index, option)| {
            let option = option.as_object()?;
            let position = index + 1;
            let label = text(option.get("label")).unwrap_or_else(|| format!("Option {position}"));
            let value = match option.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => number_text(n),
                Some(Value::Bool(b)) => b.to_string(),
                _ => label.clone(),
            };

            Some(FieldOption {
                id: text(option.get("id")).unwrap_or_else(|| format!("{field_id}-option-{position}")),
                label,
                value,
            })
        })
        .collect();

    (!normalized.is_empty()).then_some(normalized)
}

/// Reads stage completion overrides from an untrusted list.
#[must_use]
pub fn parse_stage_overrides(items: &[Value]) -> Vec<StageOverride> {
    items
        .iter()
        .filter_map(|item| {
            let item = item.as_object()?;
            Some(StageOverride {
                id: text(item.get("id"))?,
                complete: boolean(item.get("complete")),
            })
        })
        .collect()
}

/// Rebuilds automation from the catalog, taking only `enabled` flags from the payload.
fn merge_automation(items: &[Value]) -> Vec<AutomationToggle> {
    AUTOMATION_OPTIONS
        .iter()
        .map(|option| {
            let enabled = items
                .iter()
                .filter_map(Value::as_object)
                .find(|item| item.get("id").and_then(Value::as_str) == Some(option.id))
                .and_then(|item| boolean(item.get("enabled")))
                .unwrap_or(option.default_enabled);

            AutomationToggle {
                id: option.id.to_string(),
                label: option.label.to_string(),
                description: option.description.to_string(),
                enabled,
            }
        })
        .collect()
}

fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}

fn merge_payment(previous: &PaymentSettings, patch: &Map<String, Value>) -> PaymentSettings {
    let mut merged = previous.clone();

    if let Some(amount) = patch
        .get("amount")
        .and_then(Value::as_f64)
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
    {
        merged.amount = amount;
    }

    if let Some(allow) = boolean(patch.get("allowCustomAmount")) {
        merged.allow_custom_amount = allow;
    }

    if let Some(methods) = patch.get("acceptedMethods").and_then(Value::as_array) {
        let mut filtered: Vec<PaymentMethod> = Vec::new();
        for method in methods
            .iter()
            .filter_map(Value::as_str)
            .filter_map(PaymentMethod::from_name)
        {
            if !filtered.contains(&method) {
                filtered.push(method);
            }
        }
        if !filtered.is_empty() {
            merged.accepted_methods = filtered;
        }
    }

    match patch.get("dueDate") {
        Some(Value::Null) => merged.due_date = None,
        Some(Value::String(raw)) => {
            if let Some(date) = parse_due_date(raw) {
                merged.due_date = Some(date);
            }
        }
        _ => {}
    }

    merged
}

fn merge_gating(previous: &Gating, patch: &Map<String, Value>) -> Gating {
    Gating {
        restriction: patch
            .get("restriction")
            .and_then(Value::as_str)
            .map_or_else(|| previous.restriction.clone(), ToString::to_string),
        require_student_id: boolean(patch.get("requireStudentId"))
            .unwrap_or(previous.require_student_id),
        reference_field: patch
            .get("referenceField")
            .and_then(Value::as_str)
            .map_or_else(|| previous.reference_field.clone(), ToString::to_string),
    }
}

fn merge_hero(previous: &HeroSettings, patch: &Map<String, Value>) -> HeroSettings {
    let pick = |key: &str, fallback: &String| {
        patch
            .get(key)
            .and_then(Value::as_str)
            .map_or_else(|| fallback.clone(), ToString::to_string)
    };

    HeroSettings {
        heading: pick("heading", &previous.heading),
        subheading: pick("subheading", &previous.subheading),
        primary_action_label: pick("primaryActionLabel", &previous.primary_action_label),
    }
}

/// Applies an untrusted edit payload on top of the previous builder state.
///
/// Top-level keys missing from the payload keep their previous value. The payment,
/// gating and hero objects are merged key by key. Automation can only flip catalog
/// switches, never add or remove them.
///
/// # Errors
/// Returns [`Error::EmptyBuilder`] when the resulting sections hold no field at all;
/// the previous state is left untouched in that case.
pub fn apply_builder_edit(
    previous: &BuilderState,
    payload: &Value,
    actor: &str,
) -> Result<BuilderState> {
    let empty = Map::new();
    let payload = payload.as_object().unwrap_or(&empty);

    let sections = match payload.get("sections") {
        Some(candidate @ Value::Array(_)) => sanitize_sections(candidate),
        _ => previous.sections.clone(),
    };
    if sections.iter().all(|section| section.fields.is_empty()) {
        return Err(Error::EmptyBuilder);
    }

    let automation = payload
        .get("automation")
        .and_then(Value::as_array)
        .map_or_else(|| previous.automation.clone(), |items| merge_automation(items));
    let stage_progress = payload
        .get("stageProgress")
        .and_then(Value::as_array)
        .map_or_else(
            || previous.stage_progress.clone(),
            |items| build_stage_progress(&parse_stage_overrides(items)),
        );
    let payment = payload
        .get("payment")
        .and_then(Value::as_object)
        .map_or_else(
            || previous.payment.clone(),
            |patch| merge_payment(&previous.payment, patch),
        );
    let gating = payload
        .get("gating")
        .and_then(Value::as_object)
        .map_or_else(
            || previous.gating.clone(),
            |patch| merge_gating(&previous.gating, patch),
        );
    let hero = payload
        .get("hero")
        .and_then(Value::as_object)
        .map_or_else(
            || previous.hero.clone(),
            |patch| merge_hero(&previous.hero, patch),
        );

    Ok(BuilderState {
        version: previous.version,
        preset_id: text(payload.get("presetId")).unwrap_or_else(|| previous.preset_id.clone()),
        accent: text(payload.get("accent")).unwrap_or_else(|| previous.accent.clone()),
        hero,
        payment,
        automation,
        gating,
        sections,
        stage_progress,
        updated_at: Utc::now(),
        updated_by: actor.to_string(),
    })
}
