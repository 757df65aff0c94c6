//! Organization activity feed.
//!
//! Every state change an organization cares about (a page created, a builder saved, a
//! payment received) is appended here. Only the newest [`FEED_LIMIT`] entries are kept.

use crate::{
    entities::{Activity, Organization, activity, organization},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};

/// Maximum number of entries kept per organization.
pub const FEED_LIMIT: usize = 50;

/// A feed entry about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    /// Dotted event kind, e.g. `"payment.received"`
    pub kind: String,
    /// Short title
    pub title: String,
    /// Human-readable description
    pub description: String,
    /// Who caused the event
    pub actor: String,
}

/// Appends an entry to the organization's feed and bumps its `last_activity`.
///
/// Takes any connection so callers can record inside their own database transaction.
pub async fn record_activity<C: ConnectionTrait>(
    conn: &C,
    organization_id: &str,
    entry: NewActivity,
) -> Result<activity::Model> {
    let now = Utc::now();
    let model = activity::ActiveModel {
        organization_id: Set(organization_id.to_string()),
        kind: Set(entry.kind),
        title: Set(entry.title),
        description: Set(entry.description),
        actor: Set(entry.actor),
        timestamp: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let ids: Vec<i64> = Activity::find()
        .select_only()
        .column(activity::Column::Id)
        .filter(activity::Column::OrganizationId.eq(organization_id))
        .order_by_desc(activity::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;
    let stale: Vec<i64> = ids.into_iter().skip(FEED_LIMIT).collect();
    if !stale.is_empty() {
        Activity::delete_many()
            .filter(activity::Column::Id.is_in(stale))
            .exec(conn)
            .await?;
    }

    Organization::update_many()
        .col_expr(organization::Column::LastActivity, Expr::value(Some(now)))
        .filter(organization::Column::Id.eq(organization_id))
        .exec(conn)
        .await?;

    tracing::debug!(
        "Recorded {} for organization {}",
        model.kind,
        organization_id
    );
    Ok(model)
}

/// Returns the organization's feed, newest first.
pub async fn recent_activity(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<Vec<activity::Model>> {
    Activity::find()
        .filter(activity::Column::OrganizationId.eq(organization_id))
        .order_by_desc(activity::Column::Id)
        .limit(FEED_LIMIT as u64)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_organization, setup_test_db};

    fn entry(n: usize) -> NewActivity {
        NewActivity {
            kind: "paypoint.builder.updated".to_string(),
            title: format!("Edit {n}"),
            description: "Schema refined".to_string(),
            actor: "Treasurer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_bumps_last_activity() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;
        assert!(org.last_activity.is_none());

        record_activity(&db, &org.id, entry(0)).await?;

        let org = Organization::find_by_id(org.id.clone()).one(&db).await?.unwrap();
        assert!(org.last_activity.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_feed_is_capped_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;

        for n in 0..55 {
            record_activity(&db, &org.id, entry(n)).await?;
        }

        let feed = recent_activity(&db, &org.id).await?;
        assert_eq!(feed.len(), 50);
        assert_eq!(feed[0].title, "Edit 54");
        assert_eq!(feed[49].title, "Edit 5");

        let stored = Activity::find().all(&db).await?;
        assert_eq!(stored.len(), 50);
        Ok(())
    }
}
