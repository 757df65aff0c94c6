//! Shared test utilities for `PayPoint`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating organizations and payment pages with sensible defaults.

use crate::{
    core::{
        locks::PageLocks,
        page::{NewPage, create_page, set_page_status},
    },
    entities::{self, PaymentPage},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::{Value, json};

/// Display name used as the acting admin in tests.
pub const TEST_ACTOR: &str = "Test Treasurer";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates the "Engineering Society" organization with id `org-1`.
pub async fn create_test_organization(
    db: &DatabaseConnection,
) -> Result<entities::organization::Model> {
    entities::organization::ActiveModel {
        id: Set("org-1".to_string()),
        name: Set("Engineering Society".to_string()),
        category: Set("Student Association".to_string()),
        last_activity: Set(None),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a draft page with sensible defaults.
///
/// # Defaults
/// * description: "Collected by the finance committee."
/// * amount: 150.0
/// * restriction: "All members"
pub async fn create_test_page(
    db: &DatabaseConnection,
    organization: &entities::organization::Model,
    title: &str,
    preset: Option<&str>,
) -> Result<entities::payment_page::Model> {
    create_page(
        db,
        &organization.id,
        TEST_ACTOR,
        NewPage {
            title: title.to_string(),
            description: "Collected by the finance committee.".to_string(),
            amount: Some(150.0),
            builder_preset_id: preset.map(ToString::to_string),
            ..Default::default()
        },
    )
    .await
}

/// Sets up a database with one organization and one published page using the
/// default identity fields.
pub async fn setup_with_published_page()
-> Result<(DatabaseConnection, PageLocks, entities::payment_page::Model)> {
    let db = setup_test_db().await?;
    let locks = PageLocks::new();
    let organization = create_test_organization(&db).await?;
    let page = create_test_page(&db, &organization, "Semester Dues 2025", None).await?;

    set_page_status(&db, &locks, &organization.id, &page.id, "published", TEST_ACTOR).await?;
    let page = PaymentPage::find_by_id(page.id.clone())
        .one(&db)
        .await?
        .ok_or(Error::PageNotFound { reference: page.id })?;

    Ok((db, locks, page))
}

/// A complete payment for the default identity fields, sent both as responses and
/// as top-level keys.
#[must_use]
pub fn payment_payload(name: &str) -> Value {
    json!({
        "method": "mobile-money",
        "fullName": name,
        "studentId": "UG1234567",
        "department": "Computer Engineering",
        "yearGroup": "2025",
        "responses": {
            "field-full-name": name,
            "field-student-id": "UG1234567",
            "field-department": "Computer Engineering",
            "field-year-group": "2025"
        }
    })
}
