//! Snapshot validation.
//!
//! The validator inspects a loaded [`Snapshot`] and produces a structured
//! [`ValidationReport`]: per-table row counts and non-null rates for the
//! required columns, referential-key coverage, and a list of
//! [`DataQualityWarning`]s. Quality findings in the source snapshot are
//! expected and reportable; the only thing that raises here is a required
//! column that is structurally absent ([`Error::Schema`]).
//!
//! [`Snapshot`]: cstore_load::Snapshot
//! [`Error::Schema`]: cstore_result::Error::Schema

#![forbid(unsafe_code)]

pub mod checks;
pub mod reconcile;
pub mod report;

use std::time::{SystemTime, UNIX_EPOCH};

use cstore_load::Snapshot;
use cstore_model::schema::TableKind;
use cstore_result::Result;

pub use report::{
    ColumnNullRate, DataQualityWarning, QualityCheck, ReferentialReport, TableReport,
    ValidationReport,
};

/// Run the full validation suite with `now` taken from the system clock.
pub fn validate(snapshot: &Snapshot) -> Result<ValidationReport> {
    let now_micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(i64::MAX);
    validate_at(snapshot, now_micros)
}

/// Run the full validation suite against a caller-supplied clock, keeping
/// the future-date check deterministic for tests.
pub fn validate_at(snapshot: &Snapshot, now_micros: i64) -> Result<ValidationReport> {
    let mut tables = Vec::new();
    for kind in [
        TableKind::Stores,
        TableKind::Products,
        TableKind::TransactionSets,
        TableKind::TransactionItems,
        TableKind::Payments,
        TableKind::DailyAggregate,
        TableKind::Discounts,
        TableKind::Shopper,
    ] {
        if let Some(batch) = snapshot.table(kind) {
            tables.push(checks::table_report(kind, batch)?);
        }
    }

    let referential = ReferentialReport {
        orphaned_transaction_sets: snapshot.orphans.transaction_sets,
        orphaned_items_by_store: snapshot.orphans.transaction_items_store,
        orphaned_items_by_set: snapshot.orphans.transaction_items_set,
        orphaned_payments: snapshot.orphans.payments,
        orphaned_daily_agg: snapshot.orphans.daily_agg,
        orphaned_discounts: snapshot.orphans.discounts,
        unmatched_gtins: checks::unmatched_gtins(snapshot)?,
    };

    let mut warnings = Vec::new();
    checks::duplicate_warnings(snapshot, &mut warnings)?;
    checks::scan_type_warnings(snapshot, &mut warnings)?;
    checks::value_range_warnings(snapshot, now_micros, &mut warnings)?;
    checks::business_logic_warnings(snapshot, &mut warnings)?;
    reconcile::daily_aggregate_warnings(snapshot, &mut warnings)?;

    let report = ValidationReport {
        tables,
        referential,
        warnings,
    };
    tracing::debug!(
        tables = report.tables.len(),
        warnings = report.warnings.len(),
        clean = report.is_clean(),
        "validation complete"
    );
    Ok(report)
}
