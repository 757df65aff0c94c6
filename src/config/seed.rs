//! Seed data configuration module.
//!
//! Loads organizations and payment pages from a TOML file and writes the ones that are
//! not in the database yet. The path comes from `PAYPOINT_CONFIG` and defaults to
//! `config.toml`; a missing file means there is nothing to seed.
//!
//! ```toml
//! [[organizations]]
//! id = "org-1"
//! name = "Engineering Society"
//! category = "Student Association"
//!
//! [[pages]]
//! id = "pp-1"
//! organization_id = "org-1"
//! title = "Semester Dues 2025"
//! description = "Dues for the 2025 academic year."
//! amount = 150.0
//! status = "published"
//! builder_preset_id = "semester-dues"
//! ```

use crate::{
    core::page::{PageDraft, insert_page},
    entities::{Organization, PageStatus, PaymentPage, organization},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use std::path::Path;

/// Seed file used when `PAYPOINT_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

const SEED_ACTOR: &str = "system";

/// Root of the seed file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeedConfig {
    /// Organizations to create
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
    /// Payment pages to create
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

/// One `[[organizations]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationConfig {
    /// Organization id
    pub id: String,
    /// Display name
    pub name: String,
    /// Kind of organization
    #[serde(default)]
    pub category: String,
}

/// One `[[pages]]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageConfig {
    /// Page id
    pub id: String,
    /// Owning organization id
    pub organization_id: String,
    /// Page title
    pub title: String,
    /// Page description
    #[serde(default)]
    pub description: String,
    /// Amount charged per payer
    pub amount: f64,
    /// `draft`, `published` or `archived`; defaults to `draft`
    pub status: Option<String>,
    /// Eligibility note
    pub restriction: Option<String>,
    /// Blueprint the page's form starts from
    pub builder_preset_id: Option<String>,
    /// Explicit slug; derived from the organization and title when absent
    pub slug: Option<String>,
    /// Collection deadline
    pub due_date: Option<NaiveDate>,
}

/// Parses seed data from a TOML string.
pub fn parse_config(content: &str) -> Result<SeedConfig> {
    toml::from_str(content).map_err(|e| Error::Config {
        message: format!("Failed to parse seed config: {e}"),
    })
}

/// Loads seed data from `path`. Returns `None` if the file does not exist.
pub fn load_config(path: &Path) -> Result<Option<SeedConfig>> {
    if !path.exists() {
        tracing::info!("No seed file at {}, skipping seeding", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_config(&content).map(Some)
}

/// Loads seed data from `PAYPOINT_CONFIG` or [`DEFAULT_CONFIG_PATH`].
pub fn load_default_config() -> Result<Option<SeedConfig>> {
    let path = std::env::var("PAYPOINT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(Path::new(&path))
}

/// Writes configured organizations and pages that do not exist yet.
///
/// Each new page gets a builder state built from its `builder_preset_id`. Returns
/// the number of pages created.
pub async fn seed_database(db: &DatabaseConnection, config: &SeedConfig) -> Result<usize> {
    let txn = db.begin().await?;

    for org in &config.organizations {
        if Organization::find_by_id(org.id.clone()).one(&txn).await?.is_some() {
            continue;
        }
        organization::ActiveModel {
            id: Set(org.id.clone()),
            name: Set(org.name.clone()),
            category: Set(org.category.clone()),
            last_activity: Set(None),
        }
        .insert(&txn)
        .await?;
        tracing::debug!("Seeded organization {}", org.id);
    }

    let mut created = 0;
    for page in &config.pages {
        if PaymentPage::find_by_id(page.id.clone()).one(&txn).await?.is_some() {
            continue;
        }

        let organization = Organization::find_by_id(page.organization_id.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Page '{}' references unknown organization '{}'",
                    page.id, page.organization_id
                ),
            })?;
        let status = match page.status.as_deref() {
            None => PageStatus::Draft,
            Some(name) => PageStatus::from_name(name).ok_or_else(|| Error::Config {
                message: format!("Page '{}' has unknown status '{name}'", page.id),
            })?,
        };

        insert_page(
            &txn,
            &organization,
            PageDraft {
                id: page.id.clone(),
                title: page.title.clone(),
                description: page.description.clone(),
                amount: page.amount,
                restriction: page.restriction.clone(),
                slug: page.slug.clone(),
                status,
                builder_preset_id: page.builder_preset_id.clone(),
                due_date: page.due_date,
                created_by: SEED_ACTOR.to_string(),
            },
        )
        .await?;
        created += 1;
    }

    txn.commit().await?;
    Ok(created)
}
