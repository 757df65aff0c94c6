//! Payment page operations - creation, lifecycle, the builder round trip and the public view.
//!
//! Admin operations are scoped to an organization: a page id that exists but belongs
//! to another organization is reported as not found. Builder states are created lazily
//! for pages that predate the builder, from the page's flattened field list.

use crate::{
    core::{
        activity::{NewActivity, record_activity},
        factory::{BuilderContext, DEFAULT_RESTRICTION, PageContext, create_default_builder_state},
        library::PaymentMethod,
        locks::PageLocks,
        metrics::{PageMetrics, recalc_metrics},
        sanitize::apply_builder_edit,
        schema::{BuilderState, FieldSchema, PublicBuilder},
        summary::{BuilderSummary, summarize},
    },
    entities::{
        Organization, PageStatus, PaymentPage, Transaction, TransactionStatus, organization,
        payment_page, transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::instrument;

const RECENT_PAYMENTS: usize = 5;

/// Admin-facing view of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverview {
    /// Page id
    pub id: String,
    /// Page title
    pub title: String,
    /// Page description
    pub description: String,
    /// Lifecycle status
    pub status: PageStatus,
    /// Amount charged per payer
    pub amount: f64,
    /// Eligibility note
    pub restriction: String,
    /// Public path
    pub slug: String,
    /// Relative public link
    pub link: String,
    /// Sum of paid transactions
    pub total_collected: f64,
    /// Count of transactions not paid
    pub unpaid_members: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
    /// Condensed builder state
    pub builder_summary: BuilderSummary,
}

impl From<&payment_page::Model> for PageOverview {
    fn from(page: &payment_page::Model) -> Self {
        Self {
            id: page.id.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            status: page.status,
            amount: page.amount,
            restriction: page.restriction.clone(),
            slug: page.slug.clone(),
            link: page.link(),
            total_collected: page.total_collected,
            unpaid_members: page.unpaid_members,
            created_at: page.created_at,
            updated_at: page.updated_at,
            builder_summary: summarize(page.builder_state.as_ref()),
        }
    }
}

/// Result of [`get_builder`] and [`save_builder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuilderView {
    /// Page the builder belongs to
    #[serde(rename = "paypoint")]
    pub page: PageOverview,
    /// Full builder state
    pub builder: BuilderState,
}

/// Request to create a page, read leniently from an untrusted payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPage {
    /// Page title, required
    pub title: String,
    /// Page description, required
    pub description: String,
    /// Amount charged per payer, required
    pub amount: Option<f64>,
    /// Eligibility note
    pub restriction: Option<String>,
    /// Blueprint the form starts from
    pub builder_preset_id: Option<String>,
    /// Collection deadline
    pub due_date: Option<NaiveDate>,
}

impl NewPage {
    /// Reads `title`, `description`, `amount`, `restriction`, `builderPresetId` and
    /// `dueDate` from a JSON object. Values of the wrong type are treated as absent.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };

        Self {
            title: text("title").unwrap_or_default(),
            description: text("description").unwrap_or_default(),
            amount: payload.get("amount").and_then(Value::as_f64),
            restriction: text("restriction"),
            builder_preset_id: text("builderPresetId"),
            due_date: text("dueDate").and_then(|d| d.parse().ok()),
        }
    }
}

/// Everything needed to store a new page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDraft {
    /// Page id
    pub id: String,
    /// Page title
    pub title: String,
    /// Page description
    pub description: String,
    /// Amount charged per payer
    pub amount: f64,
    /// Eligibility note, defaults to "All members"
    pub restriction: Option<String>,
    /// Explicit slug; derived from the organization and title when absent
    pub slug: Option<String>,
    /// Initial status
    pub status: PageStatus,
    /// Blueprint the form starts from
    pub builder_preset_id: Option<String>,
    /// Collection deadline
    pub due_date: Option<NaiveDate>,
    /// Who created the page
    pub created_by: String,
}

/// Lowercases `text` and collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, with no leading or trailing dash.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Appends `-1`, `-2`, ... to `base` until it is not in `taken`.
#[must_use]
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    let mut slug = base.to_string();
    let mut counter = 1;
    while taken.contains(&slug) {
        slug = format!("{base}-{counter}");
        counter += 1;
    }
    slug
}

fn page_context(page: &payment_page::Model) -> PageContext {
    PageContext {
        title: Some(page.title.clone()),
        description: Some(page.description.clone()),
        amount: Some(page.amount),
        due_date: None,
        restriction: Some(page.restriction.clone()),
        updated_by: None,
    }
}

/// Looks up a page by its public slug.
pub async fn find_page_by_slug<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
) -> Result<payment_page::Model> {
    PaymentPage::find()
        .filter(payment_page::Column::Slug.eq(slug))
        .one(conn)
        .await?
        .ok_or_else(|| Error::PageNotFound {
            reference: slug.to_string(),
        })
}

async fn find_org_page<C: ConnectionTrait>(
    conn: &C,
    organization_id: &str,
    page_id: &str,
) -> Result<payment_page::Model> {
    PaymentPage::find_by_id(page_id.to_string())
        .filter(payment_page::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| Error::PageNotFound {
            reference: page_id.to_string(),
        })
}

async fn find_organization<C: ConnectionTrait>(
    conn: &C,
    organization_id: &str,
) -> Result<organization::Model> {
    Organization::find_by_id(organization_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| Error::OrganizationNotFound {
            id: organization_id.to_string(),
        })
}

/// Returns the page's builder state, creating and storing it first if the page has none.
async fn ensure_builder_state<C: ConnectionTrait>(
    conn: &C,
    page: payment_page::Model,
) -> Result<(payment_page::Model, BuilderState)> {
    if let Some(state) = page.builder_state.clone() {
        return Ok((page, state));
    }

    let fields = page.field_schema.0.clone();
    let state = create_default_builder_state(BuilderContext {
        page: Some(page_context(&page)),
        field_schema: (!fields.is_empty()).then_some(fields),
        ..Default::default()
    });
    tracing::debug!("Creating builder state for page {}", page.id);

    let mut active: payment_page::ActiveModel = page.into();
    active.field_schema = Set(FieldSchema(state.flattened_fields()));
    active.builder_state = Set(Some(state.clone()));
    let page = active.update(conn).await?;

    Ok((page, state))
}

/// Stores a new page for `organization` and logs `paypoint.created`.
pub async fn insert_page<C: ConnectionTrait>(
    conn: &C,
    organization: &organization::Model,
    draft: PageDraft,
) -> Result<payment_page::Model> {
    let slug = match draft.slug {
        Some(slug) => slug,
        None => {
            let taken: HashSet<String> = PaymentPage::find()
                .select_only()
                .column(payment_page::Column::Slug)
                .into_tuple::<String>()
                .all(conn)
                .await?
                .into_iter()
                .collect();
            let base = format!("{}/{}", slugify(&organization.name), slugify(&draft.title));
            unique_slug(&base, &taken)
        }
    };

    let restriction = draft
        .restriction
        .unwrap_or_else(|| DEFAULT_RESTRICTION.to_string());
    let state = create_default_builder_state(BuilderContext {
        page: Some(PageContext {
            title: Some(draft.title.clone()),
            description: Some(draft.description.clone()),
            amount: Some(draft.amount),
            due_date: draft.due_date,
            restriction: Some(restriction.clone()),
            updated_by: Some(draft.created_by.clone()),
        }),
        preset_id: draft.builder_preset_id,
        ..Default::default()
    });

    let now = Utc::now();
    let page = payment_page::ActiveModel {
        id: Set(draft.id),
        organization_id: Set(organization.id.clone()),
        title: Set(draft.title),
        description: Set(draft.description),
        slug: Set(slug),
        status: Set(draft.status),
        amount: Set(draft.amount),
        restriction: Set(restriction),
        field_schema: Set(FieldSchema(state.flattened_fields())),
        builder_state: Set(Some(state)),
        total_collected: Set(0.0),
        unpaid_members: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    record_activity(
        conn,
        &organization.id,
        NewActivity {
            kind: "paypoint.created".to_string(),
            title: "PayPoint created".to_string(),
            description: format!(
                "{} was created and saved as {}.",
                page.title,
                page.status.as_str()
            ),
            actor: draft.created_by,
        },
    )
    .await?;

    Ok(page)
}

/// Creates a draft page for an organization.
///
/// Title and description are required and a non-negative amount must be given. The
/// slug is `{organization}/{title}` slugified, made unique with a numeric suffix.
#[instrument(skip(db, input))]
pub async fn create_page(
    db: &DatabaseConnection,
    organization_id: &str,
    actor: &str,
    input: NewPage,
) -> Result<payment_page::Model> {
    let title = input.title.trim().to_string();
    let description = input.description.trim().to_string();
    let amount = match input.amount {
        Some(amount) if !title.is_empty() && !description.is_empty() && amount.is_finite() => {
            amount
        }
        _ => {
            return Err(Error::InvalidPage {
                message: "Title, description, and numeric amount are required.".to_string(),
            });
        }
    };
    if amount < 0.0 {
        return Err(Error::InvalidPage {
            message: "Amount cannot be negative.".to_string(),
        });
    }

    let txn = db.begin().await?;
    let organization = find_organization(&txn, organization_id).await?;
    let page = insert_page(
        &txn,
        &organization,
        PageDraft {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description,
            amount,
            restriction: input.restriction,
            slug: None,
            status: PageStatus::Draft,
            builder_preset_id: input.builder_preset_id,
            due_date: input.due_date,
            created_by: actor.to_string(),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!("Created page {} at {}", page.id, page.slug);
    Ok(page)
}

/// Lists an organization's pages, newest first.
pub async fn list_pages(db: &DatabaseConnection, organization_id: &str) -> Result<Vec<PageOverview>> {
    let pages = PaymentPage::find()
        .filter(payment_page::Column::OrganizationId.eq(organization_id))
        .order_by_desc(payment_page::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(pages.iter().map(PageOverview::from).collect())
}

/// Moves a page to `draft`, `published` or `archived` and logs `paypoint.{status}`.
#[instrument(skip(db, locks))]
pub async fn set_page_status(
    db: &DatabaseConnection,
    locks: &PageLocks,
    organization_id: &str,
    page_id: &str,
    status: &str,
    actor: &str,
) -> Result<PageOverview> {
    let status = PageStatus::from_name(status).ok_or_else(|| Error::InvalidStatus {
        status: status.to_string(),
        expected: PageStatus::NAMES,
    })?;

    find_org_page(db, organization_id, page_id).await?;
    let _guard = locks.acquire(page_id).await;
    let txn = db.begin().await?;

    let page = find_org_page(&txn, organization_id, page_id).await?;
    let mut active: payment_page::ActiveModel = page.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let page = active.update(&txn).await?;

    record_activity(
        &txn,
        organization_id,
        NewActivity {
            kind: format!("paypoint.{}", status.as_str()),
            title: format!("PayPoint {}", status.as_str()),
            description: format!("{} status updated to {}.", page.title, status.as_str()),
            actor: actor.to_string(),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!("Page {} is now {}", page.id, status.as_str());
    Ok(PageOverview::from(&page))
}

/// Returns the page with its builder state, creating the state on first access.
#[instrument(skip(db, locks))]
pub async fn get_builder(
    db: &DatabaseConnection,
    locks: &PageLocks,
    organization_id: &str,
    page_id: &str,
) -> Result<BuilderView> {
    let page = find_org_page(db, organization_id, page_id).await?;
    if let Some(builder) = page.builder_state.clone() {
        return Ok(BuilderView {
            page: PageOverview::from(&page),
            builder,
        });
    }

    let _guard = locks.acquire(page_id).await;
    let txn = db.begin().await?;
    let page = find_org_page(&txn, organization_id, page_id).await?;
    let (page, builder) = ensure_builder_state(&txn, page).await?;
    txn.commit().await?;

    Ok(BuilderView {
        page: PageOverview::from(&page),
        builder,
    })
}

/// Applies an edit payload to the page's builder state.
///
/// The page's flattened field list, amount and restriction are rewritten from the new
/// state in the same write. A rejected edit leaves the stored state untouched.
#[instrument(skip(db, locks, payload))]
pub async fn save_builder(
    db: &DatabaseConnection,
    locks: &PageLocks,
    organization_id: &str,
    page_id: &str,
    actor: &str,
    payload: &Value,
) -> Result<BuilderView> {
    find_org_page(db, organization_id, page_id).await?;
    let _guard = locks.acquire(page_id).await;
    let txn = db.begin().await?;

    let page = find_org_page(&txn, organization_id, page_id).await?;
    let (page, previous) = ensure_builder_state(&txn, page).await?;
    let next = apply_builder_edit(&previous, payload, actor)?;

    let title = page.title.clone();
    let mut active: payment_page::ActiveModel = page.into();
    active.field_schema = Set(FieldSchema(next.flattened_fields()));
    active.amount = Set(next.payment.amount);
    active.restriction = Set(next.gating.restriction.clone());
    active.updated_at = Set(next.updated_at);
    active.builder_state = Set(Some(next.clone()));
    let page = active.update(&txn).await?;

    record_activity(
        &txn,
        organization_id,
        NewActivity {
            kind: "paypoint.builder.updated".to_string(),
            title: "PayPoint builder updated".to_string(),
            description: format!("{title} schema refined by {actor}."),
            actor: actor.to_string(),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!(
        "Saved builder for page {}: {} sections, {} fields",
        page_id,
        next.sections.len(),
        next.field_count()
    );
    Ok(BuilderView {
        page: PageOverview::from(&page),
        builder: next,
    })
}

/// Owning organization as shown to payers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationSummary {
    /// Organization id
    pub id: String,
    /// Display name
    pub name: String,
    /// Kind of organization
    pub category: String,
}

/// A paid transaction as shown on the public page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPayment {
    /// Payer name
    pub member_name: String,
    /// Amount paid
    pub amount: f64,
    /// Method used
    pub method: PaymentMethod,
    /// Receipt reference
    pub reference: String,
    /// Settlement time
    pub paid_at: Option<DateTime<Utc>>,
}

/// Page details as shown to payers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPageInfo {
    /// Page id
    pub id: String,
    /// Page title
    pub title: String,
    /// Page description
    pub description: String,
    /// Amount charged per payer
    pub amount: f64,
    /// Eligibility note
    pub restriction: String,
    /// Relative public link
    pub link: String,
    /// Public path
    pub slug: String,
    /// Lifecycle status
    pub status: PageStatus,
    /// Sum of paid transactions
    pub total_collected: f64,
    /// Count of transactions not paid
    pub unpaid_members: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
    /// Public form projection, absent for pages without a builder
    pub builder: Option<PublicBuilder>,
}

/// Collection figures shown to payers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStats {
    /// Sum of paid transactions
    pub total_collected: f64,
    /// Count of transactions not paid
    pub unpaid_members: i64,
    /// Number of transactions
    pub transactions: usize,
}

/// Result of [`get_public_page`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPageView {
    /// Page details
    pub paypoint: PublicPageInfo,
    /// Owning organization
    pub organization: Option<OrganizationSummary>,
    /// Collection figures
    pub stats: PageStats,
    /// Latest paid transactions, at most five
    pub recent_transactions: Vec<RecentPayment>,
    /// Methods the page accepts
    pub payment_methods: Vec<PaymentMethod>,
}

/// Public view of a published page: form projection, figures and latest payments.
///
/// Pages that are not published are refused with [`Error::NotAcceptingPayments`].
#[instrument(skip(db))]
pub async fn get_public_page(db: &DatabaseConnection, slug: &str) -> Result<PublicPageView> {
    let page = find_page_by_slug(db, slug).await?;
    if page.status != PageStatus::Published {
        return Err(Error::NotAcceptingPayments {
            status: page.status.as_str().to_string(),
        });
    }

    let organization = Organization::find_by_id(page.organization_id.clone())
        .one(db)
        .await?
        .map(|org| OrganizationSummary {
            id: org.id,
            name: org.name,
            category: org.category,
        });

    let transactions = Transaction::find()
        .filter(transaction::Column::PageId.eq(page.id.clone()))
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    let PageMetrics {
        total_collected,
        unpaid_members,
    } = recalc_metrics(&transactions);

    let mut paid: Vec<&transaction::Model> = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Paid)
        .collect();
    paid.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
    let recent_transactions = paid
        .into_iter()
        .take(RECENT_PAYMENTS)
        .map(|t| RecentPayment {
            member_name: t.member_name.clone(),
            amount: t.amount,
            method: t.method,
            reference: t.reference.clone(),
            paid_at: t.paid_at,
        })
        .collect();

    let payment_methods = page
        .builder_state
        .as_ref()
        .map_or_else(|| PaymentMethod::ALL.to_vec(), |s| s.payment.accepted_methods.clone());

    Ok(PublicPageView {
        stats: PageStats {
            total_collected,
            unpaid_members,
            transactions: transactions.len(),
        },
        paypoint: PublicPageInfo {
            builder: page.builder_state.as_ref().map(BuilderState::public_view),
            link: page.link(),
            id: page.id,
            title: page.title,
            description: page.description,
            amount: page.amount,
            restriction: page.restriction,
            slug: page.slug,
            status: page.status,
            total_collected,
            unpaid_members,
            created_at: page.created_at,
            updated_at: page.updated_at,
        },
        organization,
        recent_transactions,
        payment_methods,
    })
}

/// Result of [`list_transactions`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionListing {
    /// Page the transactions belong to
    #[serde(rename = "paypoint")]
    pub page: PageOverview,
    /// Transactions, newest first
    pub transactions: Vec<transaction::Model>,
}

/// Lists a page's transactions, newest first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    organization_id: &str,
    page_id: &str,
) -> Result<TransactionListing> {
    let page = find_org_page(db, organization_id, page_id).await?;
    let transactions = Transaction::find()
        .filter(transaction::Column::PageId.eq(page_id))
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    Ok(TransactionListing {
        page: PageOverview::from(&page),
        transactions,
    })
}

/// Totals section of a [`PageReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Sum of paid transactions
    pub total_collected: f64,
    /// Number of transactions
    pub total_transactions: usize,
    /// Count of transactions not paid
    pub unpaid_members: i64,
}

/// Point-in-time collection report of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    /// Totals
    pub summary: ReportSummary,
    /// Transactions, newest first
    pub transactions: Vec<transaction::Model>,
    /// When the report was built
    pub generated_at: DateTime<Utc>,
}

/// Builds a collection report from the page's transactions.
pub async fn page_report(
    db: &DatabaseConnection,
    organization_id: &str,
    page_id: &str,
) -> Result<PageReport> {
    let TransactionListing { transactions, .. } =
        list_transactions(db, organization_id, page_id).await?;
    let metrics = recalc_metrics(&transactions);

    Ok(PageReport {
        summary: ReportSummary {
            total_collected: metrics.total_collected,
            total_transactions: transactions.len(),
            unpaid_members: metrics.unpaid_members,
        },
        transactions,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::{
        core::payment::submit_payment,
        entities::Activity,
        test_utils::{
            TEST_ACTOR, create_test_organization, create_test_page, payment_payload,
            setup_test_db, setup_with_published_page,
        },
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Engineering Society"), "engineering-society");
        assert_eq!(slugify("  Semester Dues 2025! "), "semester-dues-2025");
        assert_eq!(slugify("--Robotics & AI--"), "robotics-ai");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("org/dues", &taken), "org/dues");
        taken.insert("org/dues".to_string());
        taken.insert("org/dues-1".to_string());
        assert_eq!(unique_slug("org/dues", &taken), "org/dues-2");
    }

    #[test]
    fn test_new_page_from_payload() {
        let input = NewPage::from_payload(&json!({
            "title": "  Dinner ",
            "description": "Annual dinner",
            "amount": "50",
            "builderPresetId": "event-ticketing",
            "dueDate": "2025-03-01"
        }));
        assert_eq!(input.title, "Dinner");
        assert!(input.amount.is_none());
        assert_eq!(input.builder_preset_id.as_deref(), Some("event-ticketing"));
        assert_eq!(input.due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[tokio::test]
    async fn test_create_page_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;

        let page = create_test_page(&db, &org, "Semester Dues 2025", Some("semester-dues")).await?;
        assert_eq!(page.status, PageStatus::Draft);
        assert_eq!(page.slug, "engineering-society/semester-dues-2025");
        assert_eq!(page.restriction, "All members");

        let state = page.builder_state.clone().unwrap();
        assert_eq!(state.preset_id, "semester-dues");
        assert_eq!(state.updated_by, TEST_ACTOR);
        assert_eq!(page.field_schema.0, state.flattened_fields());

        let again = create_test_page(&db, &org, "Semester Dues 2025", None).await?;
        assert_eq!(again.slug, "engineering-society/semester-dues-2025-1");

        let feed = Activity::find().all(&db).await?;
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|a| a.kind == "paypoint.created"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_page_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;

        let err = create_page(
            &db,
            &org.id,
            TEST_ACTOR,
            NewPage {
                title: "Dues".to_string(),
                description: String::new(),
                amount: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPage { .. }));

        let err = create_page(
            &db,
            "org-missing",
            TEST_ACTOR,
            NewPage {
                title: "Dues".to_string(),
                description: "Dues".to_string(),
                amount: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::OrganizationNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_builder_creates_state_from_field_schema() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;

        let mut fields = page.builder_state.clone().unwrap().flattened_fields();
        fields.truncate(2);
        let mut active: payment_page::ActiveModel = page.clone().into();
        active.builder_state = Set(None);
        active.field_schema = Set(FieldSchema(fields));
        active.update(&db).await?;

        let view = get_builder(&db, &locks, &page.organization_id, &page.id).await?;
        assert_eq!(view.builder.sections.len(), 1);
        assert_eq!(view.builder.sections[0].id, "section-member-details");
        assert_eq!(view.builder.field_count(), 2);
        assert_eq!(view.page.builder_summary.progress, 25);

        let stored = PaymentPage::find_by_id(page.id).one(&db).await?.unwrap();
        assert_eq!(stored.builder_state, Some(view.builder));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_builder_other_organization_is_not_found() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        let err = get_builder(&db, &locks, "org-other", &page.id).await.unwrap_err();
        assert!(matches!(err, Error::PageNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_page_ids_leave_no_locks_behind() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        for n in 0..50 {
            let id = format!("missing-{n}");
            let err = save_builder(&db, &locks, &page.organization_id, &id, TEST_ACTOR, &json!({}))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::PageNotFound { .. }));
            let err = set_page_status(&db, &locks, &page.organization_id, &id, "archived", TEST_ACTOR)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::PageNotFound { .. }));
        }
        assert_eq!(locks.tracked(), 0);

        set_page_status(&db, &locks, &page.organization_id, &page.id, "archived", TEST_ACTOR).await?;
        assert_eq!(locks.tracked(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_builder_mirrors_page_fields() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;

        let view = save_builder(
            &db,
            &locks,
            &page.organization_id,
            &page.id,
            "Akosua",
            &json!({
                "sections": [{
                    "title": "Contact",
                    "fields": [{"id": "field-email", "label": "Email Address", "type": "email", "required": true}]
                }],
                "payment": {"amount": 175},
                "gating": {"restriction": "Level 300 only"}
            }),
        )
        .await?;

        assert_eq!(view.builder.updated_by, "Akosua");
        assert_eq!(view.page.amount, 175.0);
        assert_eq!(view.page.restriction, "Level 300 only");

        let stored = PaymentPage::find_by_id(page.id.clone()).one(&db).await?.unwrap();
        assert_eq!(stored.field_schema.0.len(), 1);
        assert_eq!(stored.field_schema.0[0].id, "field-email");

        let err = submit_payment(&db, &locks, &page.slug, &json!({"method": "card", "responses": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: Email Address.");

        let feed = Activity::find().all(&db).await?;
        let last = feed.last().unwrap();
        assert_eq!(last.kind, "paypoint.builder.updated");
        assert_eq!(last.description, format!("{} schema refined by Akosua.", page.title));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_builder_rejects_empty_and_keeps_state() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        let before = PaymentPage::find_by_id(page.id.clone()).one(&db).await?.unwrap();

        let err = save_builder(
            &db,
            &locks,
            &page.organization_id,
            &page.id,
            TEST_ACTOR,
            &json!({"sections": [{"title": "Empty", "fields": []}]}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EmptyBuilder));

        let after = PaymentPage::find_by_id(page.id).one(&db).await?.unwrap();
        assert_eq!(before, after);
        Ok(())
    }

    #[tokio::test]
    async fn test_public_page_projection() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        for n in 0..7 {
            submit_payment(&db, &locks, &page.slug, &payment_payload(&format!("Payer {n}"))).await?;
        }

        let view = get_public_page(&db, &page.slug).await?;
        assert_eq!(view.stats.transactions, 7);
        assert_eq!(view.stats.total_collected, page.amount * 7.0);
        assert_eq!(view.recent_transactions.len(), 5);
        assert_eq!(view.recent_transactions[0].member_name, "Payer 6");
        assert_eq!(view.organization.as_ref().unwrap().name, "Engineering Society");
        assert_eq!(view.payment_methods, PaymentMethod::ALL.to_vec());

        let json = serde_json::to_value(&view)?;
        let builder = &json["paypoint"]["builder"];
        assert!(builder.get("sections").is_some());
        assert!(builder.get("automation").is_none());
        assert!(builder.get("stageProgress").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_public_page_requires_published() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;
        let page = create_test_page(&db, &org, "Robotics Workshop Fee", None).await?;

        let err = get_public_page(&db, &page.slug).await.unwrap_err();
        assert!(matches!(err, Error::NotAcceptingPayments { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_public_page_unknown_slug() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<payment_page::Model>::new()])
            .into_connection();

        let err = get_public_page(&db, "nobody/nothing").await.unwrap_err();
        assert!(matches!(err, Error::PageNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_change_and_report() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;

        let err = set_page_status(&db, &locks, &page.organization_id, &page.id, "closed", TEST_ACTOR)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStatus { .. }));

        submit_payment(&db, &locks, &page.slug, &payment_payload("Ama")).await?;
        let report = page_report(&db, &page.organization_id, &page.id).await?;
        assert_eq!(report.summary.total_transactions, 1);
        assert_eq!(report.summary.total_collected, page.amount);
        assert_eq!(report.summary.unpaid_members, 0);

        let overview =
            set_page_status(&db, &locks, &page.organization_id, &page.id, "draft", TEST_ACTOR)
                .await?;
        assert_eq!(overview.status, PageStatus::Draft);
        assert_eq!(list_pages(&db, &page.organization_id).await?.len(), 1);
        Ok(())
    }
}
