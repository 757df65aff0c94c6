//! Activity entity - Per-organization feed of notable events.
//!
//! Each entry has a dotted `kind` (e.g. `payment.received`), a short title, a
//! description, the acting person and a timestamp.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Activity feed database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier; higher ids are newer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Organization whose feed this entry belongs to
    pub organization_id: String,
    /// Event kind, e.g. `"paypoint.builder.updated"`
    pub kind: String,
    /// Short title
    pub title: String,
    /// Human-readable description
    pub description: String,
    /// Who caused the event
    pub actor: String,
    /// When the event happened
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Activity and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one organization
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
