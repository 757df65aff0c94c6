//! Payment intake - validates a payer's submission against the live form and records it.
//!
//! [`prepare_payment`] is the pure decision step: given a page and a raw payload it
//! either produces the transaction to record or the first reason to reject. Checks run
//! in a fixed order: page status, payment method, form responses, payer name.
//! [`submit_payment`] wraps it in the page lock and a database transaction so the
//! record, the page figures and the activity entry land together or not at all.

use crate::{
    core::{
        activity::{NewActivity, record_activity},
        library::{CanonicalField, PaymentMethod},
        locks::PageLocks,
        metrics::refresh_page_metrics,
        page::find_page_by_slug,
        responses::{ResponseEntry, Responses, coerce, normalize_responses},
    },
    entities::{PageStatus, PaymentPage, TransactionStatus, payment_page, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

/// A validated submission, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPayment {
    /// Resolved payer name
    pub member_name: String,
    /// Resolved student id
    pub student_id: Option<String>,
    /// Resolved department
    pub department: Option<String>,
    /// Resolved year group
    pub year_group: Option<String>,
    /// Chosen payment method
    pub method: PaymentMethod,
    /// Answers to record
    pub responses: Responses,
}

/// What the payer gets back after a successful payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Stored transaction id
    pub transaction_id: i64,
    /// Receipt reference
    pub reference: String,
    /// Amount recorded
    pub amount: f64,
    /// Title of the page paid against
    pub page_title: String,
    /// Link back to the page
    pub link: String,
    /// Method used
    pub method: PaymentMethod,
    /// When the payment was recorded
    pub processed_at: DateTime<Utc>,
}

fn top_level<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_method(payload: &Value) -> Result<PaymentMethod> {
    match payload.get("method") {
        None | Some(Value::Null) => Err(Error::MissingPaymentMethod),
        Some(Value::String(name)) if name.trim().is_empty() => Err(Error::MissingPaymentMethod),
        Some(Value::String(name)) => {
            PaymentMethod::from_name(name.trim()).ok_or_else(|| Error::InvalidMethod {
                method: name.clone(),
            })
        }
        Some(other) => Err(Error::InvalidMethod {
            method: other.to_string(),
        }),
    }
}

/// Answers sent to a page without builder sections are kept as sent, keyed by their
/// own names.
fn legacy_responses(raw: Option<&Value>) -> Responses {
    let Some(Value::Object(entries)) = raw else {
        return Responses::default();
    };

    Responses(
        entries
            .iter()
            .map(|(key, value)| {
                let label = value
                    .get("label")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string();
                let entry = ResponseEntry {
                    label,
                    value: coerce(Some(value)),
                };
                (key.clone(), entry)
            })
            .collect(),
    )
}

/// Validates a raw submission for `page`.
///
/// The payload carries `method`, a `responses` object keyed by field id and, for pages
/// without builder sections, the top-level `fullName`, `studentId`, `department` and
/// `yearGroup` keys. Canonical identity values are read from the responses first and
/// from the top-level keys second.
pub fn prepare_payment(page: &payment_page::Model, payload: &Value) -> Result<PreparedPayment> {
    if page.status != PageStatus::Published {
        return Err(Error::NotAcceptingPayments {
            status: page.status.as_str().to_string(),
        });
    }

    let method = parse_method(payload)?;
    let offered = page
        .builder_state
        .as_ref()
        .is_none_or(|state| state.payment.accepted_methods.contains(&method));
    if !offered {
        return Err(Error::InvalidMethod {
            method: method.as_str().to_string(),
        });
    }

    let absent = Value::Null;
    let incoming = payload.get("responses").unwrap_or(&absent);
    let has_sections = page
        .builder_state
        .as_ref()
        .is_some_and(|state| !state.sections.is_empty());

    let responses = if has_sections {
        let normalized = normalize_responses(page.builder_state.as_ref(), incoming);
        if !normalized.missing.is_empty() {
            return Err(Error::MissingRequiredFields {
                labels: normalized.missing,
            });
        }
        normalized.responses
    } else {
        let complete = CanonicalField::ALL
            .into_iter()
            .all(|field| top_level(payload, field.payload_key()).is_some());
        if !complete {
            return Err(Error::MissingLegacyFields);
        }
        legacy_responses(payload.get("responses"))
    };

    let resolve = |field: CanonicalField| {
        responses
            .trimmed_value(field.field_id())
            .or_else(|| top_level(payload, field.payload_key()))
            .map(ToString::to_string)
    };

    let member_name = resolve(CanonicalField::FullName).ok_or(Error::MissingPayerName)?;

    Ok(PreparedPayment {
        member_name,
        student_id: resolve(CanonicalField::StudentId),
        department: resolve(CanonicalField::Department),
        year_group: resolve(CanonicalField::YearGroup),
        method,
        responses,
    })
}

fn payment_reference(page_id: &str, now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("PP-{}-{}-{}", page_id, now.timestamp_millis(), &nonce[..8])
}

/// Records a payment against the page published at `slug`.
///
/// Runs under the page lock: the page is re-read, the submission validated against its
/// current form, and the transaction, page figures and activity entry written in one
/// database transaction. A rejected submission changes nothing.
#[instrument(skip(db, locks, payload))]
pub async fn submit_payment(
    db: &DatabaseConnection,
    locks: &PageLocks,
    slug: &str,
    payload: &Value,
) -> Result<PaymentReceipt> {
    let page = find_page_by_slug(db, slug).await?;

    let _guard = locks.acquire(&page.id).await;
    let txn = db.begin().await?;

    let page = PaymentPage::find_by_id(page.id.clone())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::PageNotFound {
            reference: slug.to_string(),
        })?;

    let prepared = prepare_payment(&page, payload)?;
    let now = Utc::now();

    let record = transaction::ActiveModel {
        page_id: Set(page.id.clone()),
        member_name: Set(prepared.member_name),
        student_id: Set(prepared.student_id),
        department: Set(prepared.department),
        year_group: Set(prepared.year_group),
        amount: Set(page.amount),
        status: Set(TransactionStatus::Paid),
        reference: Set(payment_reference(&page.id, now)),
        paid_at: Set(Some(now)),
        resolved_at: Set(None),
        method: Set(prepared.method),
        responses: Set(prepared.responses),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    refresh_page_metrics(&txn, &page.id).await?;

    record_activity(
        &txn,
        &page.organization_id,
        NewActivity {
            kind: "payment.received".to_string(),
            title: "Payment received".to_string(),
            description: format!(
                "{} paid {:.2} for {} via {}.",
                record.member_name,
                record.amount,
                page.title,
                record.method.as_str()
            ),
            actor: record.member_name.clone(),
        },
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        "Recorded payment {} of {:.2} on page {}",
        record.reference,
        record.amount,
        page.id
    );

    Ok(PaymentReceipt {
        transaction_id: record.id,
        reference: record.reference,
        amount: record.amount,
        page_title: page.title.clone(),
        link: page.link(),
        method: record.method,
        processed_at: now,
    })
}
