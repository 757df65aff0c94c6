//! Organization entity - The body that owns payment pages (society, club, department).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Stable organization id (e.g. `"org-1"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name, also the first half of every page slug
    pub name: String,
    /// Kind of organization (e.g. "Student Association")
    pub category: String,
    /// Time of the last payment or page change
    pub last_activity: Option<DateTimeUtc>,
}

/// Defines relationships between Organization and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One organization owns many payment pages
    #[sea_orm(has_many = "super::payment_page::Entity")]
    PaymentPages,
    /// One organization has one activity feed
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::payment_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPages.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
