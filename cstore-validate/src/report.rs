//! Validation report types.

use serde::Serialize;
use std::fmt;

/// Non-null coverage for one required column.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnNullRate {
    pub column: String,
    /// Percentage of rows with a non-null value, 0–100. An empty table
    /// reports 100: there is nothing missing.
    pub non_null_pct: f64,
}

/// Row count and required-column coverage for one table.
#[derive(Clone, Debug, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub columns: Vec<ColumnNullRate>,
}

/// Foreign-key values with no matching parent row.
///
/// The orphan counts come from the loader, which excluded those rows; the
/// GTIN count is computed here because unmatched products stay in the
/// snapshot (they simply lack product details).
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ReferentialReport {
    pub orphaned_transaction_sets: usize,
    pub orphaned_items_by_store: usize,
    pub orphaned_items_by_set: usize,
    pub orphaned_payments: usize,
    pub orphaned_daily_agg: usize,
    pub orphaned_discounts: usize,
    /// Scanned line items whose GTIN is absent from the product master.
    pub unmatched_gtins: usize,
}

impl ReferentialReport {
    pub fn total_orphans(&self) -> usize {
        self.orphaned_transaction_sets
            + self.orphaned_items_by_store
            + self.orphaned_items_by_set
            + self.orphaned_payments
            + self.orphaned_daily_agg
            + self.orphaned_discounts
    }
}

/// The quality checks the validator runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum QualityCheck {
    DuplicateTransactionSetIds,
    DuplicateTransactionItemIds,
    InvalidScanType,
    NegativeAmount,
    NegativeQuantity,
    ExtremeAmount,
    ExtremeQuantity,
    FutureDate,
    DateBeforeHistory,
    BasketTotalMismatch,
    ExcessiveDiscount,
    DailyAggregateDrift,
}

/// One non-fatal finding. Warnings never block querying; they describe the
/// snapshot as it is.
#[derive(Clone, Debug, Serialize)]
pub struct DataQualityWarning {
    pub check: QualityCheck,
    pub count: usize,
    pub message: String,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {} ({} rows)", self.check, self.message, self.count)
    }
}

/// The validator's structured output.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub tables: Vec<TableReport>,
    pub referential: ReferentialReport,
    pub warnings: Vec<DataQualityWarning>,
}

impl ValidationReport {
    /// No orphans and no quality findings at all.
    pub fn is_clean(&self) -> bool {
        self.referential.total_orphans() == 0
            && self.referential.unmatched_gtins == 0
            && self.warnings.is_empty()
    }

    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}
