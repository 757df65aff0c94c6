//! Blueprint catalog - named starter layouts for common collection scenarios.
//!
//! Blueprints and the default member-details section are declared as `const` templates
//! and turned into owned [`Section`]s on every call, so no two builders ever share a
//! section, field or option list.

use crate::core::schema::{FieldDefinition, FieldOption, FieldType, FieldWidth, Section};
use serde::Serialize;

/// Id and title of the section wrapping an explicit flat field list.
pub const MEMBER_DETAILS_SECTION_ID: &str = "section-member-details";
const MEMBER_DETAILS_TITLE: &str = "Member Details";
const MEMBER_DETAILS_DESCRIPTION: &str = "Primary identifiers required before payment.";

struct OptionSpec {
    id: &'static str,
    label: &'static str,
    value: &'static str,
}

struct FieldSpec {
    id: &'static str,
    label: &'static str,
    field_type: FieldType,
    required: bool,
    helper_text: &'static str,
    options: &'static [OptionSpec],
}

impl FieldSpec {
    fn build(&self) -> FieldDefinition {
        let options = (!self.options.is_empty()).then(|| {
            self.options
                .iter()
                .map(|option| FieldOption {
                    id: option.id.to_string(),
                    label: option.label.to_string(),
                    value: option.value.to_string(),
                })
                .collect()
        });

        FieldDefinition {
            id: self.id.to_string(),
            label: self.label.to_string(),
            field_type: self.field_type,
            required: self.required,
            helper_text: self.helper_text.to_string(),
            placeholder: String::new(),
            width: FieldWidth::Full,
            options,
            validations: None,
        }
    }
}

struct SectionSpec {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    fields: &'static [FieldSpec],
}

impl SectionSpec {
    fn build(&self) -> Section {
        Section {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            fields: self.fields.iter().map(FieldSpec::build).collect(),
        }
    }
}

struct BlueprintSpec {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    accent: &'static str,
    tags: &'static [&'static str],
    sections: &'static [SectionSpec],
}

const DEFAULT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        id: "field-full-name",
        label: "Full Name",
        field_type: FieldType::Text,
        required: true,
        helper_text: "Enter your name as it appears on your student ID",
        options: &[],
    },
    FieldSpec {
        id: "field-student-id",
        label: "Student ID",
        field_type: FieldType::Text,
        required: true,
        helper_text: "e.g., UG1234567",
        options: &[],
    },
    FieldSpec {
        id: "field-department",
        label: "Department",
        field_type: FieldType::Text,
        required: true,
        helper_text: "Provide your current department",
        options: &[],
    },
    FieldSpec {
        id: "field-year-group",
        label: "Year Group",
        field_type: FieldType::Text,
        required: true,
        helper_text: "e.g., 2025",
        options: &[],
    },
];

const BLUEPRINTS: &[BlueprintSpec] = &[
    BlueprintSpec {
        id: "semester-dues",
        title: "Semester Dues",
        description: "Balanced for union or association dues that need strict verification.",
        accent: "indigo",
        tags: &["Recurring", "Verification-heavy"],
        sections: &[
            SectionSpec {
                id: "section-member-identity",
                title: "Member Identity",
                description: "Baseline details required for verification and receipting.",
                fields: DEFAULT_FIELDS,
            },
            SectionSpec {
                id: "section-membership-meta",
                title: "Membership Context",
                description: "Capture additional tags that help treasurers reconcile faster.",
                fields: &[
                    FieldSpec {
                        id: "field-phone-number",
                        label: "WhatsApp Number",
                        field_type: FieldType::Phone,
                        required: true,
                        helper_text: "Used to send payment confirmation and escalations.",
                        options: &[],
                    },
                    FieldSpec {
                        id: "field-program",
                        label: "Program of Study",
                        field_type: FieldType::Text,
                        required: false,
                        helper_text: "Optional but helpful for reporting segments.",
                        options: &[],
                    },
                    FieldSpec {
                        id: "field-level",
                        label: "Level",
                        field_type: FieldType::Select,
                        required: true,
                        helper_text: "",
                        options: &[
                            OptionSpec { id: "level-100", label: "Level 100", value: "100" },
                            OptionSpec { id: "level-200", label: "Level 200", value: "200" },
                            OptionSpec { id: "level-300", label: "Level 300", value: "300" },
                            OptionSpec { id: "level-400", label: "Level 400", value: "400" },
                        ],
                    },
                ],
            },
        ],
    },
    BlueprintSpec {
        id: "event-ticketing",
        title: "Event Ticketing",
        description: "Designed for ticket sales where add-ons or merch options exist.",
        accent: "rose",
        tags: &["Event", "Tiered pricing"],
        sections: &[
            SectionSpec {
                id: "section-attendee",
                title: "Attendee Details",
                description: "Contact info for sending QR passes and receipts.",
                fields: &[
                    FieldSpec {
                        id: "field-attendee-name",
                        label: "Attendee Name",
                        field_type: FieldType::Text,
                        required: true,
                        helper_text: "Name that should appear on your badge.",
                        options: &[],
                    },
                    FieldSpec {
                        id: "field-attendee-email",
                        label: "Email for Ticket",
                        field_type: FieldType::Email,
                        required: true,
                        helper_text: "We will send a QR ticket to this email.",
                        options: &[],
                    },
                    FieldSpec {
                        id: "field-seat-type",
                        label: "Seat Type",
                        field_type: FieldType::Select,
                        required: true,
                        helper_text: "",
                        options: &[
                            OptionSpec { id: "seat-standard", label: "Standard", value: "standard" },
                            OptionSpec { id: "seat-premium", label: "Premium", value: "premium" },
                            OptionSpec { id: "seat-vip", label: "VIP", value: "vip" },
                        ],
                    },
                ],
            },
            SectionSpec {
                id: "section-addons",
                title: "Add-ons",
                description: "Optional extras members might want to pre-pay.",
                fields: &[
                    FieldSpec {
                        id: "field-merch-pack",
                        label: "Merch Pack",
                        field_type: FieldType::Checkbox,
                        required: false,
                        helper_text: "Limited edition hoodie + tote.",
                        options: &[],
                    },
                    FieldSpec {
                        id: "field-dietary",
                        label: "Dietary Notes",
                        field_type: FieldType::Textarea,
                        required: false,
                        helper_text: "Share allergies for catering purposes.",
                        options: &[],
                    },
                ],
            },
        ],
    },
];

/// A named starter layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blueprint {
    /// Blueprint id, stored as the builder's `presetId`
    pub id: String,
    /// Display title
    pub title: String,
    /// What the blueprint is for
    pub description: String,
    /// Default color theme
    pub accent: String,
    /// Short descriptive tags
    pub tags: Vec<String>,
    /// Default layout
    pub sections: Vec<Section>,
}

impl BlueprintSpec {
    fn build(&self) -> Blueprint {
        Blueprint {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            accent: self.accent.to_string(),
            tags: self.tags.iter().map(ToString::to_string).collect(),
            sections: self.sections.iter().map(SectionSpec::build).collect(),
        }
    }
}

/// Returns a fresh copy of every blueprint.
#[must_use]
pub fn blueprints() -> Vec<Blueprint> {
    BLUEPRINTS.iter().map(BlueprintSpec::build).collect()
}

/// Looks up a blueprint by id, returning a fresh copy.
#[must_use]
pub fn find_blueprint(id: &str) -> Option<Blueprint> {
    BLUEPRINTS
        .iter()
        .find(|blueprint| blueprint.id == id)
        .map(BlueprintSpec::build)
}

/// The four required identity fields: Full Name, Student ID, Department, Year Group.
#[must_use]
pub fn default_fields() -> Vec<FieldDefinition> {
    DEFAULT_FIELDS.iter().map(FieldSpec::build).collect()
}

/// Wraps a flat field list into the synthetic "Member Details" section.
#[must_use]
pub fn member_details_section(fields: Vec<FieldDefinition>) -> Section {
    Section {
        id: MEMBER_DETAILS_SECTION_ID.to_string(),
        title: MEMBER_DETAILS_TITLE.to_string(),
        description: MEMBER_DETAILS_DESCRIPTION.to_string(),
        fields,
    }
}
