//! Database configuration module for `PayPoint`.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! The default store is an in-memory `SQLite` database, so nothing survives a restart
//! unless `DATABASE_URL` points at a file. Tables are generated from the entity
//! definitions with `Schema::create_table_from_entity`, so the schema always matches
//! the Rust structs without hand-written SQL.

use crate::entities::{Activity, Organization, PaymentPage, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Store used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Gets the database URL from environment variable or returns the in-memory default.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to an in-memory `SQLite` database if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables using `SeaORM`'s schema generation from entity definitions.
///
/// Tables are created parents first: organizations, payment pages, transactions and
/// the activity feed.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let organization_table = schema.create_table_from_entity(Organization);
    let page_table = schema.create_table_from_entity(PaymentPage);
    let transaction_table = schema.create_table_from_entity(Transaction);
    let activity_table = schema.create_table_from_entity(Activity);

    db.execute(builder.build(&organization_table)).await?;
    db.execute(builder.build(&page_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&activity_table)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        activity::Model as ActivityModel, organization::Model as OrganizationModel,
        payment_page::Model as PaymentPageModel, transaction::Model as TransactionModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<OrganizationModel> = Organization::find().limit(1).all(&db).await?;
        let _: Vec<PaymentPageModel> = PaymentPage::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<ActivityModel> = Activity::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[test]
    fn test_default_database_is_in_memory() {
        assert_eq!(DEFAULT_DATABASE_URL, "sqlite::memory:");
    }
}
