//! Builder state model - the configurable form attached to one payment page.
//!
//! A [`BuilderState`] is an ordered list of [`Section`]s of [`FieldDefinition`]s plus the
//! hero copy, payment settings, gating rule, automation toggles and authoring progress.
//! The whole document is stored as a single JSON column on the payment page, which is
//! why the types derive `FromJsonQueryResult`. Field names serialize in camelCase so
//! stored documents keep the shape the dashboard edits.

use crate::core::library::PaymentMethod;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Current builder document version.
pub const BUILDER_VERSION: u32 = 1;

/// Input type of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text
    #[default]
    Text,
    /// Multi-line text
    Textarea,
    /// Numeric input
    Number,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Dropdown backed by `options`
    Select,
    /// Acknowledgement checkbox
    Checkbox,
}

impl FieldType {
    /// Every supported field type, in library order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Textarea,
        Self::Number,
        Self::Email,
        Self::Phone,
        Self::Select,
        Self::Checkbox,
    ];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
        }
    }

    /// Parses a wire name, returning `None` for unknown types.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Layout width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    /// Spans the whole row
    #[default]
    Full,
    /// Shares the row with one other field
    Half,
}

impl FieldWidth {
    /// Parses a wire name, returning `None` for unknown widths.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(Self::Full),
            "half" => Some(Self::Half),
            _ => None,
        }
    }
}

/// One choice of a `select` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stable option id
    pub id: String,
    /// Text shown to the payer
    pub label: String,
    /// Value recorded when the option is chosen
    pub value: String,
}

/// One input in a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Unique id within the owning page
    pub id: String,
    /// Human-readable label, also used in missing-field messages
    pub label: String,
    /// Input type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether a blank value blocks submission
    pub required: bool,
    /// Hint shown under the input
    #[serde(default)]
    pub helper_text: String,
    /// Placeholder shown inside the input
    #[serde(default)]
    pub placeholder: String,
    /// Layout width
    #[serde(default)]
    pub width: FieldWidth,
    /// Choices, only meaningful for `select`; never an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    /// Opaque validation rule descriptors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<serde_json::Value>>,
}

/// An ordered, named group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section id
    pub id: String,
    /// Section heading
    pub title: String,
    /// Section blurb
    #[serde(default)]
    pub description: String,
    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Copy shown at the top of the public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSettings {
    /// Main heading
    pub heading: String,
    /// Supporting text
    pub subheading: String,
    /// Label of the submit button
    pub primary_action_label: String,
}

/// How much is collected and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    /// Amount charged per payer, never negative
    pub amount: f64,
    /// Whether the payer may change the amount
    pub allow_custom_amount: bool,
    /// Accepted payment methods, never empty
    pub accepted_methods: Vec<PaymentMethod>,
    /// Optional collection deadline
    pub due_date: Option<NaiveDate>,
}

/// One automation switch; the set of ids always equals the automation catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationToggle {
    /// Catalog id
    pub id: String,
    /// Catalog label
    pub label: String,
    /// Catalog description
    pub description: String,
    /// Whether the automation is switched on
    pub enabled: bool,
}

/// Eligibility rule attached to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gating {
    /// Free-text restriction (who may pay)
    pub restriction: String,
    /// Whether a student id must be collected
    pub require_student_id: bool,
    /// Field id used as the payer's reference
    pub reference_field: String,
}

/// One authoring milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    /// Stage template id
    pub id: String,
    /// Stage title
    pub title: String,
    /// Stage description
    pub description: String,
    /// Checklist items of the stage
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Whether the stage is done
    pub complete: bool,
}

/// The full configurable form attached to one payment page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct BuilderState {
    /// Document version, currently always [`BUILDER_VERSION`]
    pub version: u32,
    /// Blueprint id or `"custom"`
    pub preset_id: String,
    /// Color theme key
    pub accent: String,
    /// Hero copy
    pub hero: HeroSettings,
    /// Payment settings
    pub payment: PaymentSettings,
    /// Automation switches in catalog order
    pub automation: Vec<AutomationToggle>,
    /// Eligibility rule
    pub gating: Gating,
    /// Form sections in display order
    pub sections: Vec<Section>,
    /// Authoring milestones in template order
    pub stage_progress: Vec<StageProgress>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
    /// Display name of the last editor
    pub updated_by: String,
}

impl BuilderState {
    /// Iterates every field in section-then-field order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    /// Total number of fields across all sections.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|section| section.fields.len()).sum()
    }

    /// Concatenation of all sections' fields, the flattened view stored on the page.
    #[must_use]
    pub fn flattened_fields(&self) -> Vec<FieldDefinition> {
        self.fields().cloned().collect()
    }

    /// Projection safe to show to payers: no automation or authoring progress.
    #[must_use]
    pub fn public_view(&self) -> PublicBuilder {
        PublicBuilder {
            preset_id: self.preset_id.clone(),
            accent: self.accent.clone(),
            hero: self.hero.clone(),
            payment: self.payment.clone(),
            sections: self.sections.clone(),
            gating: self.gating.clone(),
        }
    }
}

/// Public projection of a [`BuilderState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBuilder {
    /// Blueprint id or `"custom"`
    pub preset_id: String,
    /// Color theme key
    pub accent: String,
    /// Hero copy
    pub hero: HeroSettings,
    /// Payment settings
    pub payment: PaymentSettings,
    /// Form sections
    pub sections: Vec<Section>,
    /// Eligibility rule
    pub gating: Gating,
}

/// Flattened field list kept on the page alongside the structured builder state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct FieldSchema(pub Vec<FieldDefinition>);
