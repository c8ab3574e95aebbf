//! Daily-aggregate reconciliation.
//!
//! The pre-rolled daily table is a fast path, not a second source of truth:
//! per-GTIN revenue summed from it must stay within tolerance of the same
//! sum over the line items. Tolerance is 1% of the item-level revenue with an
//! absolute floor of one cent. Drift is a warning; the aggregate stays usable
//! because the report says exactly how far off it is.

use cstore_load::Snapshot;
use cstore_model::batch::{f64_at, f64_col, i64_at, i64_col};
use cstore_model::schema::col;
use cstore_result::Result;
use rustc_hash::FxHashMap;

use crate::report::{DataQualityWarning, QualityCheck};

pub const REVENUE_TOLERANCE_RATIO: f64 = 0.01;
pub const REVENUE_TOLERANCE_FLOOR: f64 = 0.01;

fn revenue_by_gtin(
    batch: &arrow::record_batch::RecordBatch,
    gtin_col: &str,
    revenue_col: &str,
) -> Result<FxHashMap<i64, f64>> {
    let gtins = i64_col(batch, gtin_col)?;
    let revenues = f64_col(batch, revenue_col)?;
    let mut totals: FxHashMap<i64, f64> = FxHashMap::default();
    for row in 0..batch.num_rows() {
        if let (Some(gtin), Some(revenue)) = (i64_at(gtins, row), f64_at(revenues, row)) {
            *totals.entry(gtin).or_default() += revenue;
        }
    }
    Ok(totals)
}

/// Count GTINs whose daily-aggregate revenue drifts beyond tolerance from the
/// item-level truth. GTINs present on only one side compare against zero.
pub fn daily_aggregate_drift(snapshot: &Snapshot) -> Result<usize> {
    let Some(daily) = &snapshot.daily_agg else {
        return Ok(0);
    };
    let item_totals = revenue_by_gtin(
        &snapshot.transaction_items,
        col::GTIN,
        col::GRAND_TOTAL_AMOUNT,
    )?;
    let daily_totals = revenue_by_gtin(daily, col::GTIN, col::TOTAL_REVENUE_AMOUNT)?;

    let mut gtins: Vec<i64> = item_totals.keys().chain(daily_totals.keys()).copied().collect();
    gtins.sort_unstable();
    gtins.dedup();

    let mut drifted = 0usize;
    for gtin in gtins {
        let item_revenue = item_totals.get(&gtin).copied().unwrap_or(0.0);
        let daily_revenue = daily_totals.get(&gtin).copied().unwrap_or(0.0);
        let tolerance = (item_revenue.abs() * REVENUE_TOLERANCE_RATIO).max(REVENUE_TOLERANCE_FLOOR);
        if (item_revenue - daily_revenue).abs() > tolerance {
            drifted += 1;
        }
    }
    Ok(drifted)
}

pub fn daily_aggregate_warnings(
    snapshot: &Snapshot,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<()> {
    let drifted = daily_aggregate_drift(snapshot)?;
    if drifted > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::DailyAggregateDrift,
            count: drifted,
            message: "products whose daily aggregate disagrees with item-level revenue beyond 1%"
                .into(),
        });
    }
    Ok(())
}
