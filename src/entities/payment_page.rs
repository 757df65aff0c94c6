//! Payment page entity - One collection campaign (dues, tickets, workshop fees).
//!
//! The page keeps two views of its form: the structured `builder_state` document and
//! the flattened `field_schema` list. Both are JSON columns and are always written
//! together. `total_collected` and `unpaid_members` are derived from the page's
//! transactions and are never set directly.

use crate::core::schema::{BuilderState, FieldSchema};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment page
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Being edited, not visible to payers
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Live and accepting payments
    #[sea_orm(string_value = "published")]
    Published,
    /// Closed for good
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl PageStatus {
    /// Accepted status names, for error messages.
    pub const NAMES: &'static str = "draft, published, archived";

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Payment page database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_pages")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Stable page id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Page title
    pub title: String,
    /// Page description
    pub description: String,
    /// Public path, `{organization}/{title}` slugified and unique
    #[sea_orm(unique)]
    pub slug: String,
    /// Lifecycle status
    pub status: PageStatus,
    /// Amount charged per payer, mirrors the builder's payment amount
    pub amount: f64,
    /// Eligibility note, mirrors the builder's gating restriction
    pub restriction: String,
    /// Flattened fields of all builder sections
    pub field_schema: FieldSchema,
    /// Structured form definition, created lazily for pages that predate the builder
    pub builder_state: Option<BuilderState>,
    /// Sum of paid transaction amounts
    pub total_collected: f64,
    /// Number of transactions that are not paid
    pub unpaid_members: i64,
    /// When the page was created
    pub created_at: DateTimeUtc,
    /// When the page or its builder last changed
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Relative link payers use to reach the page.
    #[must_use]
    pub fn link(&self) -> String {
        format!("/paypoint/{}", self.slug)
    }
}

/// Defines relationships between `PaymentPage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each page belongs to one organization
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    /// One page has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
