//! Builder state factory - constructs the default form for a payment page.
//!
//! [`create_default_builder_state`] has no required inputs and always succeeds. Sections
//! are resolved in this order: explicit sections, an explicit flat field list wrapped
//! into a "Member Details" section, the requested blueprint's layout, and finally the
//! four default identity fields.

use crate::core::{
    blueprint::{default_fields, find_blueprint, member_details_section},
    library::{AUTOMATION_OPTIONS, CanonicalField, PaymentMethod, STAGE_TEMPLATES},
    schema::{
        AutomationToggle, BUILDER_VERSION, BuilderState, FieldDefinition, Gating, HeroSettings,
        PaymentSettings, Section, StageProgress,
    },
};
use chrono::{NaiveDate, Utc};

/// Preset id used when no blueprint applies.
pub const CUSTOM_PRESET: &str = "custom";
/// Accent used when neither the caller nor a blueprint picks one.
pub const DEFAULT_ACCENT: &str = "indigo";
/// Restriction used when the page has none.
pub const DEFAULT_RESTRICTION: &str = "All members";

const DEFAULT_HEADING: &str = "New PayPoint";
const DEFAULT_SUBHEADING: &str =
    "Launch a branded payment page and collect the exact data finance teams expect.";
const DEFAULT_ACTION_LABEL: &str = "Continue to payment";
const SYSTEM_ACTOR: &str = "system";

/// Details of the owning payment page that seed the hero, payment and gating settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    /// Page title, used as the hero heading
    pub title: Option<String>,
    /// Page description, used as the hero subheading
    pub description: Option<String>,
    /// Amount charged per payer
    pub amount: Option<f64>,
    /// Collection deadline
    pub due_date: Option<NaiveDate>,
    /// Eligibility note
    pub restriction: Option<String>,
    /// Who created the page
    pub updated_by: Option<String>,
}

/// Explicit completion flag for one authoring stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOverride {
    /// Stage template id
    pub id: String,
    /// Completion flag, `None` when the caller sent no usable value
    pub complete: Option<bool>,
}

/// Inputs to [`create_default_builder_state`]; every part is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderContext {
    /// Owning page
    pub page: Option<PageContext>,
    /// Requested blueprint id
    pub preset_id: Option<String>,
    /// Explicit accent
    pub accent: Option<String>,
    /// Explicit flat field list
    pub field_schema: Option<Vec<FieldDefinition>>,
    /// Explicit section list
    pub sections: Option<Vec<Section>>,
    /// Stage completion overrides
    pub stage_progress: Option<Vec<StageOverride>>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Builds a complete builder state from the given context.
///
/// Every section, field and option in the result is owned by the result alone, so
/// two states built from the same blueprint can be edited independently.
#[must_use]
pub fn create_default_builder_state(context: BuilderContext) -> BuilderState {
    let BuilderContext {
        page,
        preset_id,
        accent,
        field_schema,
        sections,
        stage_progress,
    } = context;
    let page = page.unwrap_or_default();

    let blueprint = preset_id.as_deref().and_then(find_blueprint);

    let resolved_preset = blueprint.as_ref().map_or_else(
        || non_empty(preset_id.as_ref()).unwrap_or(CUSTOM_PRESET).to_string(),
        |b| b.id.clone(),
    );
    let resolved_accent = non_empty(accent.as_ref())
        .map(ToString::to_string)
        .or_else(|| blueprint.as_ref().map(|b| b.accent.clone()))
        .unwrap_or_else(|| DEFAULT_ACCENT.to_string());

    let derived_sections = match (sections, field_schema) {
        (Some(sections), _) if !sections.is_empty() => sections,
        (_, Some(fields)) if !fields.is_empty() => vec![member_details_section(fields)],
        _ => blueprint.map_or_else(
            || vec![member_details_section(default_fields())],
            |b| b.sections,
        ),
    };

    BuilderState {
        version: BUILDER_VERSION,
        preset_id: resolved_preset,
        accent: resolved_accent,
        hero: HeroSettings {
            heading: non_empty(page.title.as_ref())
                .unwrap_or(DEFAULT_HEADING)
                .to_string(),
            subheading: non_empty(page.description.as_ref())
                .unwrap_or(DEFAULT_SUBHEADING)
                .to_string(),
            primary_action_label: DEFAULT_ACTION_LABEL.to_string(),
        },
        payment: PaymentSettings {
            amount: page.amount.unwrap_or(0.0),
            allow_custom_amount: false,
            accepted_methods: PaymentMethod::ALL.to_vec(),
            due_date: page.due_date,
        },
        automation: default_automation(),
        gating: Gating {
            restriction: non_empty(page.restriction.as_ref())
                .unwrap_or(DEFAULT_RESTRICTION)
                .to_string(),
            require_student_id: true,
            reference_field: CanonicalField::StudentId.field_id().to_string(),
        },
        sections: derived_sections,
        stage_progress: build_stage_progress(stage_progress.as_deref().unwrap_or_default()),
        updated_at: Utc::now(),
        updated_by: non_empty(page.updated_by.as_ref())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string(),
    }
}

/// The automation catalog with every switch at its default.
#[must_use]
pub fn default_automation() -> Vec<AutomationToggle> {
    AUTOMATION_OPTIONS
        .iter()
        .map(|option| AutomationToggle {
            id: option.id.to_string(),
            label: option.label.to_string(),
            description: option.description.to_string(),
            enabled: option.default_enabled,
        })
        .collect()
}

/// Builds the stage checklist from the templates, applying overrides by id.
///
/// A stage is complete when its override says so; without an override it falls back
/// to the template's default, and only the first stage is complete by default. When an
/// id is overridden more than once, the last entry counts.
#[must_use]
pub fn build_stage_progress(overrides: &[StageOverride]) -> Vec<StageProgress> {
    STAGE_TEMPLATES
        .iter()
        .enumerate()
        .map(|(index, template)| {
            let complete = overrides
                .iter()
                .rfind(|o| o.id == template.id)
                .and_then(|o| o.complete)
                .unwrap_or(template.default_complete || index == 0);

            StageProgress {
                id: template.id.to_string(),
                title: template.title.to_string(),
                description: template.description.to_string(),
                bullets: template.bullets.iter().map(ToString::to_string).collect(),
                complete,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::schema::FieldType;

    #[test]
    fn test_default_state_without_context() {
        let state = create_default_builder_state(BuilderContext::default());

        assert_eq!(state.version, 1);
        assert_eq!(state.preset_id, "custom");
        assert_eq!(state.accent, "indigo");
        assert_eq!(state.sections.len(), 1);

        let section = &state.sections[0];
        assert_eq!(section.title, "Member Details");
        assert_eq!(section.fields.len(), 4);
        assert!(
            section
                .fields
                .iter()
                .all(|f| f.required && f.field_type == FieldType::Text)
        );

        assert!(state.stage_progress[0].complete);
        assert!(state.stage_progress[1..].iter().all(|s| !s.complete));
        assert_eq!(state.updated_by, "system");
        assert_eq!(state.payment.accepted_methods, PaymentMethod::ALL.to_vec());
        assert_eq!(state.gating.restriction, "All members");
        assert_eq!(state.gating.reference_field, "field-student-id");
    }

    #[test]
    fn test_blueprint_sets_preset_and_accent() {
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("event-ticketing".to_string()),
            ..Default::default()
        });

        assert_eq!(state.preset_id, "event-ticketing");
        assert_eq!(state.accent, "rose");
        assert_eq!(state.sections[0].id, "section-attendee");
    }

    #[test]
    fn test_unknown_preset_is_passed_through() {
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("my-own-layout".to_string()),
            ..Default::default()
        });

        assert_eq!(state.preset_id, "my-own-layout");
        assert_eq!(state.accent, "indigo");
        assert_eq!(state.sections[0].title, "Member Details");
    }

    #[test]
    fn test_explicit_accent_wins_over_blueprint() {
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("event-ticketing".to_string()),
            accent: Some("emerald".to_string()),
            ..Default::default()
        });
        assert_eq!(state.accent, "emerald");
    }

    #[test]
    fn test_section_resolution_order() {
        let mut custom_fields = default_fields();
        custom_fields.truncate(1);
        let explicit_sections = vec![Section {
            id: "s-explicit".to_string(),
            title: "Explicit".to_string(),
            description: String::new(),
            fields: custom_fields.clone(),
        }];

        // Explicit sections beat everything
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("semester-dues".to_string()),
            field_schema: Some(default_fields()),
            sections: Some(explicit_sections),
            ..Default::default()
        });
        assert_eq!(state.sections[0].id, "s-explicit");

        // A flat field list beats the blueprint
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("semester-dues".to_string()),
            field_schema: Some(custom_fields),
            ..Default::default()
        });
        assert_eq!(state.sections.len(), 1);
        assert_eq!(state.sections[0].id, "section-member-details");
        assert_eq!(state.sections[0].fields.len(), 1);
        assert_eq!(state.preset_id, "semester-dues");

        // Empty explicit lists fall through to the blueprint
        let state = create_default_builder_state(BuilderContext {
            preset_id: Some("semester-dues".to_string()),
            field_schema: Some(Vec::new()),
            sections: Some(Vec::new()),
            ..Default::default()
        });
        assert_eq!(state.sections[0].id, "section-member-identity");
    }

    #[test]
    fn test_page_context_seeds_settings() {
        let due = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let state = create_default_builder_state(BuilderContext {
            page: Some(PageContext {
                title: Some("Semester Dues 2025".to_string()),
                description: Some("Dues for all members".to_string()),
                amount: Some(150.0),
                due_date: Some(due),
                restriction: Some("All year groups".to_string()),
                updated_by: Some("Treasurer".to_string()),
            }),
            ..Default::default()
        });

        assert_eq!(state.hero.heading, "Semester Dues 2025");
        assert_eq!(state.hero.subheading, "Dues for all members");
        assert_eq!(state.payment.amount, 150.0);
        assert_eq!(state.payment.due_date, Some(due));
        assert_eq!(state.gating.restriction, "All year groups");
        assert_eq!(state.updated_by, "Treasurer");
    }

    #[test]
    fn test_stage_overrides() {
        let progress = build_stage_progress(&[
            StageOverride {
                id: "context".to_string(),
                complete: Some(false),
            },
            StageOverride {
                id: "preview".to_string(),
                complete: Some(true),
            },
            StageOverride {
                id: "form".to_string(),
                complete: None,
            },
        ]);

        let flags: Vec<bool> = progress.iter().map(|s| s.complete).collect();
        assert_eq!(flags, [false, false, false, true]);
    }

    #[test]
    fn test_repeated_stage_override_uses_last_entry() {
        let progress = build_stage_progress(&[
            StageOverride {
                id: "form".to_string(),
                complete: Some(true),
            },
            StageOverride {
                id: "form".to_string(),
                complete: Some(false),
            },
        ]);

        let form = progress.iter().find(|s| s.id == "form").unwrap();
        assert!(!form.complete);
    }

    #[test]
    fn test_states_from_same_blueprint_are_isolated() {
        let context = BuilderContext {
            preset_id: Some("semester-dues".to_string()),
            ..Default::default()
        };
        let mut first = create_default_builder_state(context.clone());
        let second = create_default_builder_state(context);

        first.sections[1].fields[2]
            .options
            .as_mut()
            .unwrap()
            .push(crate::core::schema::FieldOption {
                id: "level-500".to_string(),
                label: "Level 500".to_string(),
                value: "500".to_string(),
            });
        first.sections[0].fields[0].label = "Changed".to_string();

        assert_eq!(
            second.sections[1].fields[2].options.as_ref().unwrap().len(),
            4
        );
        assert_eq!(second.sections[0].fields[0].label, "Full Name");
    }
}
