//! Core business logic - framework-agnostic form builder and payment operations.

/// Organization activity feed
pub mod activity;
/// Named starter layouts
pub mod blueprint;
/// Default builder state construction
pub mod factory;
/// Field library, stage templates, automation catalog and payment methods
pub mod library;
/// Per-page mutual exclusion
pub mod locks;
/// Page aggregate recalculation and transaction status changes
pub mod metrics;
/// Page lifecycle, builder round trip, public view and reports
pub mod page;
/// Payment validation and recording
pub mod payment;
/// Payer answer normalization against the live form
pub mod responses;
/// Cleaning of untrusted builder edits
pub mod sanitize;
/// Builder state data model
pub mod schema;
/// Condensed builder summaries
pub mod summary;
