//! Static catalogs the builder is assembled from.
//!
//! Holds the field template library, the authoring stage templates, the automation
//! catalog, the accepted payment methods and the canonical field ids used to resolve
//! a payer's identity. Everything here is immutable data; anything handed out to a
//! caller is an owned copy.

use crate::core::{
    blueprint::{Blueprint, blueprints},
    schema::{FieldOption, FieldType},
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed set of payment methods a page can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    /// Mobile money wallet
    #[sea_orm(string_value = "mobile-money")]
    #[serde(rename = "mobile-money")]
    MobileMoney,
    /// Debit or credit card
    #[sea_orm(string_value = "card")]
    #[serde(rename = "card")]
    Card,
}

impl PaymentMethod {
    /// Every accepted method, in display order.
    pub const ALL: [Self; 2] = [Self::MobileMoney, Self::Card];

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MobileMoney => "mobile-money",
            Self::Card => "card",
        }
    }

    /// Parses a wire name, returning `None` for methods outside the enum.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

/// Well-known fields given special handling when resolving who paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    /// The payer's display name, mandatory for a receipt
    FullName,
    /// Student identifier
    StudentId,
    /// Academic department
    Department,
    /// Graduation or intake year
    YearGroup,
}

impl CanonicalField {
    /// All canonical roles.
    pub const ALL: [Self; 4] = [
        Self::FullName,
        Self::StudentId,
        Self::Department,
        Self::YearGroup,
    ];

    /// Field id the role is looked up under in normalized responses.
    #[must_use]
    pub const fn field_id(self) -> &'static str {
        match self {
            Self::FullName => "field-full-name",
            Self::StudentId => "field-student-id",
            Self::Department => "field-department",
            Self::YearGroup => "field-year-group",
        }
    }

    /// Top-level key of the raw payment payload used as a fallback.
    #[must_use]
    pub const fn payload_key(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::StudentId => "studentId",
            Self::Department => "department",
            Self::YearGroup => "yearGroup",
        }
    }
}

/// One entry of the field template library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTemplate {
    /// Field type this template produces
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Name shown in the palette
    pub label: &'static str,
    /// What the field is for
    pub description: &'static str,
    /// Settings the type supports
    pub capabilities: &'static [&'static str],
    /// Example answer
    pub sample_value: &'static str,
    /// Starter options for `select`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_template: Option<Vec<FieldOption>>,
}

/// Template an authoring stage is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTemplate {
    /// Stage id
    pub id: &'static str,
    /// Stage title
    pub title: &'static str,
    /// Stage description
    pub description: &'static str,
    /// Checklist items
    pub bullets: &'static [&'static str],
    /// Whether a fresh builder starts with this stage done
    pub default_complete: bool,
}

/// Entry of the automation catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationOption {
    /// Automation id
    pub id: &'static str,
    /// Automation label
    pub label: &'static str,
    /// What the automation does
    pub description: &'static str,
    /// Whether the automation is on by default
    pub default_enabled: bool,
}

/// Authoring stages in the order they are tracked.
pub const STAGE_TEMPLATES: [StageTemplate; 4] = [
    StageTemplate {
        id: "context",
        title: "Guardrails",
        description: "Clarify who can pay, communication tone, and due-date expectations.",
        bullets: &[
            "Eligibility & restriction note",
            "Payment closing behavior",
            "Owner acknowledgement",
        ],
        default_complete: true,
    },
    StageTemplate {
        id: "form",
        title: "Form Schema",
        description: "Decide on the data capture structure and validations members must satisfy.",
        bullets: &["Sections & ordering", "Field validations", "Default helper text"],
        default_complete: false,
    },
    StageTemplate {
        id: "automation",
        title: "Automation",
        description: "Confirm reminders, reconciliation cadence, and finance collaboration.",
        bullets: &["Reminder channels", "Finance recipients", "Reporting cadence"],
        default_complete: false,
    },
    StageTemplate {
        id: "preview",
        title: "Preview & Publish",
        description: "Ensure the payment page looks correct before members see it.",
        bullets: &["Branding review", "Accessibility pass", "Final hand-off"],
        default_complete: false,
    },
];

/// Automations every builder carries, in display order.
pub const AUTOMATION_OPTIONS: [AutomationOption; 3] = [
    AutomationOption {
        id: "auto-reminders",
        label: "Payment reminders",
        description: "Email/SMS nudges every 3 days for members who have not paid.",
        default_enabled: true,
    },
    AutomationOption {
        id: "auto-exports",
        label: "Daily reconciliation export",
        description: "Send a CSV digest to finance at 6AM daily.",
        default_enabled: true,
    },
    AutomationOption {
        id: "auto-close",
        label: "Auto-close on due date",
        description: "Automatically pause collections after the due date.",
        default_enabled: false,
    },
];

/// Returns the field template library, one entry per [`FieldType`].
#[must_use]
pub fn field_library() -> Vec<FieldTemplate> {
    FieldType::ALL.into_iter().map(field_template).collect()
}

fn field_template(field_type: FieldType) -> FieldTemplate {
    let (label, description, capabilities, sample_value): (_, _, &'static [&'static str], _) =
        match field_type {
            FieldType::Text => (
                "Short Text",
                "Single-line responses for names, IDs, locations, and custom identifiers.",
                &["required", "placeholder", "helperText", "regex"],
                "e.g., Ama Owusu",
            ),
            FieldType::Textarea => (
                "Paragraph",
                "Multi-line responses for narratives like justification notes.",
                &["required", "helperText", "charLimit"],
                "Share any context we need to approve your exemption.",
            ),
            FieldType::Number => (
                "Number",
                "For numeric inputs like ballot counts or donation top-ups.",
                &["required", "min", "max"],
                "25",
            ),
            FieldType::Email => (
                "Email Address",
                "Automatically validates email format for digital receipts.",
                &["required", "domainRestriction"],
                "member@university.edu",
            ),
            FieldType::Phone => (
                "Phone / WhatsApp",
                "Collects phone numbers in international format for MoMo confirmations.",
                &["required", "countryCode"],
                "+233 54 555 0101",
            ),
            FieldType::Select => (
                "Dropdown",
                "Predefined options for programs, houses, ticket categories, etc.",
                &["required", "options"],
                "Level 300",
            ),
            FieldType::Checkbox => (
                "Checkbox",
                "Capture acknowledgements such as refund limitations.",
                &["required"],
                "I confirm my details are accurate.",
            ),
        };

    let option_template = (field_type == FieldType::Select).then(|| {
        vec![
            FieldOption {
                id: "option-a".to_string(),
                label: "Option A".to_string(),
                value: "A".to_string(),
            },
            FieldOption {
                id: "option-b".to_string(),
                label: "Option B".to_string(),
                value: "B".to_string(),
            },
        ]
    });

    FieldTemplate {
        field_type,
        label,
        description,
        capabilities,
        sample_value,
        option_template,
    }
}

/// Everything the builder UI needs to render its palettes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderMetadata {
    /// Field template library
    pub field_library: Vec<FieldTemplate>,
    /// Authoring stages
    pub stage_templates: Vec<StageTemplate>,
    /// Starter layouts
    pub blueprints: Vec<Blueprint>,
    /// Automation catalog
    pub automation_options: Vec<AutomationOption>,
}

/// Builds a fresh copy of all builder catalogs.
#[must_use]
pub fn builder_metadata() -> BuilderMetadata {
    BuilderMetadata {
        field_library: field_library(),
        stage_templates: STAGE_TEMPLATES.to_vec(),
        blueprints: blueprints(),
        automation_options: AUTOMATION_OPTIONS.to_vec(),
    }
}
