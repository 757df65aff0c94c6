//! Aggregate recalculation for payment pages.
//!
//! `total_collected` and `unpaid_members` are never edited directly. Whenever a
//! transaction is added or changes status the page's figures are recomputed from its
//! full transaction list in the same database transaction.

use crate::{
    core::locks::PageLocks,
    entities::{PaymentPage, Transaction, TransactionStatus, payment_page, transaction},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::instrument;

/// Derived figures of one payment page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    /// Sum of amounts over paid transactions
    pub total_collected: f64,
    /// Count of transactions that are not paid
    pub unpaid_members: i64,
}

/// Computes page figures from its transactions.
#[must_use]
pub fn recalc_metrics(transactions: &[transaction::Model]) -> PageMetrics {
    let (total_collected, unpaid) = transactions.iter().fold((0.0, 0_i64), |(sum, unpaid), t| {
        if t.status == TransactionStatus::Paid {
            (sum + t.amount, unpaid)
        } else {
            (sum, unpaid + 1)
        }
    });

    PageMetrics {
        total_collected,
        unpaid_members: unpaid,
    }
}

/// Recomputes and stores a page's figures, also bumping its `updated_at`.
pub async fn refresh_page_metrics<C: ConnectionTrait>(conn: &C, page_id: &str) -> Result<PageMetrics> {
    let page = PaymentPage::find_by_id(page_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| Error::PageNotFound {
            reference: page_id.to_string(),
        })?;

    let transactions = Transaction::find()
        .filter(transaction::Column::PageId.eq(page_id))
        .all(conn)
        .await?;
    let metrics = recalc_metrics(&transactions);

    let mut active: payment_page::ActiveModel = page.into();
    active.total_collected = Set(metrics.total_collected);
    active.unpaid_members = Set(metrics.unpaid_members);
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;

    Ok(metrics)
}

/// Changes a transaction's status and recomputes its page's figures.
///
/// Only transactions on the organization's own pages can be changed. Only `status`
/// changes, plus `resolved_at` on refunds.
#[instrument(skip(db, locks))]
pub async fn update_transaction_status(
    db: &DatabaseConnection,
    locks: &PageLocks,
    organization_id: &str,
    transaction_id: i64,
    status: &str,
) -> Result<transaction::Model> {
    let status = TransactionStatus::from_name(status).ok_or_else(|| Error::InvalidStatus {
        status: status.to_string(),
        expected: TransactionStatus::NAMES,
    })?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    let owned = PaymentPage::find_by_id(existing.page_id.clone())
        .filter(payment_page::Column::OrganizationId.eq(organization_id))
        .one(db)
        .await?
        .is_some();
    if !owned {
        return Err(Error::TransactionNotFound { id: transaction_id });
    }

    let _guard = locks.acquire(&existing.page_id).await;
    let txn = db.begin().await?;

    let current = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    let page_id = current.page_id.clone();

    let now = Utc::now();
    let mut active: transaction::ActiveModel = current.into();
    active.status = Set(status);
    if status == TransactionStatus::Refunded {
        active.resolved_at = Set(Some(now));
    }
    let updated = active.update(&txn).await?;

    let metrics = refresh_page_metrics(&txn, &page_id).await?;
    txn.commit().await?;

    tracing::info!(
        "Transaction {} marked {:?}; page {} now at {:.2} collected",
        transaction_id,
        status,
        page_id,
        metrics.total_collected
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{library::PaymentMethod, payment::submit_payment, responses::Responses},
        test_utils::{payment_payload, setup_with_published_page},
    };

    fn txn(id: i64, amount: f64, status: TransactionStatus) -> transaction::Model {
        transaction::Model {
            id,
            page_id: "pp-1".to_string(),
            member_name: "Ama".to_string(),
            student_id: None,
            department: None,
            year_group: None,
            amount,
            status,
            reference: format!("PP-pp-1-{id}"),
            paid_at: None,
            resolved_at: None,
            method: PaymentMethod::Card,
            responses: Responses::default(),
        }
    }

    #[test]
    fn test_recalc_sums_only_paid() {
        let metrics = recalc_metrics(&[
            txn(1, 150.0, TransactionStatus::Paid),
            txn(2, 250.0, TransactionStatus::Paid),
            txn(3, 100.0, TransactionStatus::Pending),
            txn(4, 50.0, TransactionStatus::Refunded),
        ]);

        assert_eq!(metrics.total_collected, 400.0);
        assert_eq!(metrics.unpaid_members, 2);
    }

    #[test]
    fn test_recalc_empty() {
        let metrics = recalc_metrics(&[]);
        assert_eq!(metrics.total_collected, 0.0);
        assert_eq!(metrics.unpaid_members, 0);
    }

    #[tokio::test]
    async fn test_refund_recalculates_page() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        submit_payment(&db, &locks, &page.slug, &payment_payload("Ama")).await?;
        submit_payment(&db, &locks, &page.slug, &payment_payload("Kojo")).await?;

        let first = Transaction::find()
            .filter(transaction::Column::PageId.eq(page.id.clone()))
            .one(&db)
            .await?
            .unwrap();
        let refunded = update_transaction_status(&db, &locks, &page.organization_id, first.id, "refunded").await?;
        assert_eq!(refunded.status, TransactionStatus::Refunded);
        assert!(refunded.resolved_at.is_some());

        let page = PaymentPage::find_by_id(page.id).one(&db).await?.unwrap();
        assert_eq!(page.total_collected, page.amount);
        assert_eq!(page.unpaid_members, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_change_keeps_paid_at() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        let receipt = submit_payment(&db, &locks, &page.slug, &payment_payload("Ama")).await?;
        let org = page.organization_id.as_str();
        let recorded = Transaction::find_by_id(receipt.transaction_id).one(&db).await?.unwrap();

        update_transaction_status(&db, &locks, org, receipt.transaction_id, "pending").await?;
        let repaid = update_transaction_status(&db, &locks, org, receipt.transaction_id, "paid").await?;

        assert_eq!(repaid.status, TransactionStatus::Paid);
        assert_eq!(repaid.paid_at, recorded.paid_at);
        assert_eq!(repaid.resolved_at, None);
        assert_eq!(repaid.amount, recorded.amount);
        assert_eq!(repaid.reference, recorded.reference);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_and_transaction() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        let org = page.organization_id.as_str();

        let err = update_transaction_status(&db, &locks, org, 1, "lost").await.unwrap_err();
        assert!(matches!(err, Error::InvalidStatus { .. }));

        let err = update_transaction_status(&db, &locks, org, 999, "paid").await.unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_other_organization_cannot_refund() -> Result<()> {
        let (db, locks, page) = setup_with_published_page().await?;
        let receipt = submit_payment(&db, &locks, &page.slug, &payment_payload("Ama")).await?;

        let err = update_transaction_status(&db, &locks, "org-2", receipt.transaction_id, "refunded")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound { .. }));

        let stored = Transaction::find_by_id(receipt.transaction_id).one(&db).await?.unwrap();
        assert_eq!(stored.status, TransactionStatus::Paid);
        Ok(())
    }
}
