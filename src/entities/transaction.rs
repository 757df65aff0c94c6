//! Transaction entity - One payment made against a payment page.
//!
//! Records are immutable once created except for `status` and `resolved_at`, which a
//! refund workflow may change. `responses` holds every answer of the form as it was
//! submitted, keyed by field id.

use crate::core::{library::PaymentMethod, responses::Responses};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Settled, counts towards `total_collected`
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Awaiting settlement
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Returned to the payer
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl TransactionStatus {
    /// Accepted status names, for error messages.
    pub const NAMES: &'static str = "paid, pending, refunded";

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "paid" => Some(Self::Paid),
            "pending" => Some(Self::Pending),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier; higher ids are newer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Page the payment was made against
    pub page_id: String,
    /// Payer display name, always present
    pub member_name: String,
    /// Payer student id
    pub student_id: Option<String>,
    /// Payer department
    pub department: Option<String>,
    /// Payer year group
    pub year_group: Option<String>,
    /// Amount paid
    pub amount: f64,
    /// Settlement status
    pub status: TransactionStatus,
    /// Receipt reference, unique across all pages
    #[sea_orm(unique)]
    pub reference: String,
    /// When the payment settled
    pub paid_at: Option<DateTimeUtc>,
    /// When a refund or other status change was resolved
    pub resolved_at: Option<DateTimeUtc>,
    /// How the payer paid
    pub method: PaymentMethod,
    /// Submitted answers keyed by field id
    pub responses: Responses,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one payment page
    #[sea_orm(
        belongs_to = "super::payment_page::Entity",
        from = "Column::PageId",
        to = "super::payment_page::Column::Id"
    )]
    PaymentPage,
}

impl Related<super::payment_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
