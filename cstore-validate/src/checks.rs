//! Individual validation checks.
//!
//! Thresholds follow the dashboard's operating assumptions: transaction
//! history starts in 2019, a single line over $10,000 or 1,000 units is an
//! outlier, and basket totals may disagree with their parts by at most one
//! cent of rounding.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use cstore_load::Snapshot;
use cstore_model::batch::{f64_at, f64_col, i64_at, i64_col, str_at, str_col, ts_at, ts_col};
use cstore_model::schema::{col, TableKind};
use cstore_model::ScanType;
use cstore_result::Result;
use rustc_hash::FxHashSet;
use time::{Date, Month};

use crate::report::{ColumnNullRate, DataQualityWarning, QualityCheck, TableReport};

const EXTREME_AMOUNT: f64 = 10_000.0;
const EXTREME_QUANTITY: f64 = 1_000.0;
const BASKET_ROUNDING: f64 = 0.01;

fn history_start_micros() -> i64 {
    Date::from_calendar_date(2019, Month::January, 1)
        .expect("valid history epoch")
        .midnight()
        .assume_utc()
        .unix_timestamp()
        * 1_000_000
}

/// Row count plus non-null percentage for each required column.
///
/// A structurally absent required column raises `Error::Schema`; everything
/// else is reported, not raised.
pub fn table_report(kind: TableKind, batch: &RecordBatch) -> Result<TableReport> {
    let rows = batch.num_rows();
    let mut columns = Vec::new();
    for name in kind.required_columns() {
        let array = cstore_model::batch::column(batch, name)?;
        let non_null_pct = if rows == 0 {
            100.0
        } else {
            let non_null = rows - array.null_count();
            (non_null as f64 / rows as f64) * 100.0
        };
        columns.push(ColumnNullRate {
            column: (*name).to_string(),
            non_null_pct,
        });
    }
    Ok(TableReport {
        table: kind.name().to_string(),
        rows,
        columns,
    })
}

fn duplicate_count(batch: &RecordBatch, column: &str) -> Result<usize> {
    let ids = str_col(batch, column)?;
    let mut seen = FxHashSet::default();
    let mut duplicates = 0usize;
    for row in 0..ids.len() {
        if let Some(id) = str_at(ids, row) {
            if !seen.insert(id) {
                duplicates += 1;
            }
        }
    }
    Ok(duplicates)
}

pub fn duplicate_warnings(
    snapshot: &Snapshot,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<()> {
    let dup_sets = duplicate_count(&snapshot.transaction_sets, col::TRANSACTION_SET_ID)?;
    if dup_sets > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::DuplicateTransactionSetIds,
            count: dup_sets,
            message: "transaction sets sharing an identifier".into(),
        });
    }
    let dup_items = duplicate_count(&snapshot.transaction_items, col::TRANSACTION_ITEM_ID)?;
    if dup_items > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::DuplicateTransactionItemIds,
            count: dup_items,
            message: "transaction items sharing an identifier".into(),
        });
    }
    Ok(())
}

/// Scanned items whose GTIN has no row in the product master. NONSCAN items
/// carry no product identifier and are not counted.
pub fn unmatched_gtins(snapshot: &Snapshot) -> Result<usize> {
    let known: FxHashSet<i64> = {
        let gtins = i64_col(&snapshot.products, col::GTIN)?;
        (0..gtins.len()).filter_map(|r| i64_at(gtins, r)).collect()
    };

    let items = &snapshot.transaction_items;
    let scan_types = str_col(items, col::SCAN_TYPE)?;
    let gtins = i64_col(items, col::GTIN)?;
    let mut unmatched = 0usize;
    for row in 0..items.num_rows() {
        let scannable = str_at(scan_types, row)
            .and_then(ScanType::parse)
            .is_some_and(|st| st.scannable());
        if !scannable {
            continue;
        }
        match i64_at(gtins, row) {
            Some(gtin) if known.contains(&gtin) => {}
            _ => unmatched += 1,
        }
    }
    Ok(unmatched)
}

pub fn scan_type_warnings(
    snapshot: &Snapshot,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<()> {
    let scan_types = str_col(&snapshot.transaction_items, col::SCAN_TYPE)?;
    let mut invalid = 0usize;
    let mut samples: Vec<String> = Vec::new();
    for row in 0..scan_types.len() {
        if let Some(value) = str_at(scan_types, row) {
            if ScanType::parse(value).is_none() {
                invalid += 1;
                if samples.len() < 5 && !samples.iter().any(|s| s == value) {
                    samples.push(value.to_string());
                }
            }
        }
    }
    if invalid > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::InvalidScanType,
            count: invalid,
            message: format!("scan types outside the enumeration: {samples:?}"),
        });
    }
    Ok(())
}

pub fn value_range_warnings(
    snapshot: &Snapshot,
    now_micros: i64,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<()> {
    let items = &snapshot.transaction_items;
    let amounts = f64_col(items, col::GRAND_TOTAL_AMOUNT)?;
    let quantities = f64_col(items, col::UNIT_QUANTITY)?;
    let dates = ts_col(items, col::DATE_TIME)?;
    let history_start = history_start_micros();

    let mut negative_amounts = 0usize;
    let mut negative_quantities = 0usize;
    let mut extreme_amounts = 0usize;
    let mut extreme_quantities = 0usize;
    let mut future_dates = 0usize;
    let mut prehistory_dates = 0usize;

    for row in 0..items.num_rows() {
        if let Some(amount) = f64_at(amounts, row) {
            if amount < 0.0 {
                negative_amounts += 1;
            } else if amount > EXTREME_AMOUNT {
                extreme_amounts += 1;
            }
        }
        if let Some(qty) = f64_at(quantities, row) {
            if qty < 0.0 {
                negative_quantities += 1;
            } else if qty > EXTREME_QUANTITY {
                extreme_quantities += 1;
            }
        }
        if let Some(ts) = ts_at(dates, row) {
            if ts > now_micros {
                future_dates += 1;
            } else if ts < history_start {
                prehistory_dates += 1;
            }
        }
    }

    let mut push = |check, count: usize, message: &str| {
        if count > 0 {
            warnings.push(DataQualityWarning {
                check,
                count,
                message: message.into(),
            });
        }
    };
    push(
        QualityCheck::NegativeAmount,
        negative_amounts,
        "line items with negative amounts",
    );
    push(
        QualityCheck::NegativeQuantity,
        negative_quantities,
        "line items with negative quantities",
    );
    push(
        QualityCheck::ExtremeAmount,
        extreme_amounts,
        "line items above the $10,000 outlier threshold",
    );
    push(
        QualityCheck::ExtremeQuantity,
        extreme_quantities,
        "line items above the 1,000-unit outlier threshold",
    );
    push(
        QualityCheck::FutureDate,
        future_dates,
        "line items dated in the future",
    );
    push(
        QualityCheck::DateBeforeHistory,
        prehistory_dates,
        "line items dated before 2019",
    );
    Ok(())
}

pub fn business_logic_warnings(
    snapshot: &Snapshot,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<()> {
    let sets = &snapshot.transaction_sets;
    let mismatches = if let (Ok(subtotals), Ok(taxes), Ok(grands)) = (
        f64_col(sets, col::SUBTOTAL_AMOUNT),
        f64_col(sets, col::TAX_AMOUNT),
        f64_col(sets, col::GRAND_TOTAL_AMOUNT),
    ) {
        (0..sets.num_rows())
            .filter(|&row| {
                let subtotal = f64_at(subtotals, row).unwrap_or(0.0);
                let tax = f64_at(taxes, row).unwrap_or(0.0);
                match f64_at(grands, row) {
                    Some(grand) => (grand - (subtotal + tax)).abs() > BASKET_ROUNDING,
                    None => false,
                }
            })
            .count()
    } else {
        0
    };
    if mismatches > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::BasketTotalMismatch,
            count: mismatches,
            message: "baskets where grand total differs from subtotal + tax".into(),
        });
    }

    let items = &snapshot.transaction_items;
    let excessive = if let (Ok(discounts), Ok(prices), Ok(quantities)) = (
        f64_col(items, col::DISCOUNT_AMOUNT),
        f64_col(items, col::UNIT_PRICE),
        f64_col(items, col::UNIT_QUANTITY),
    ) {
        (0..items.num_rows())
            .filter(|&row| {
                let value =
                    f64_at(prices, row).unwrap_or(0.0) * f64_at(quantities, row).unwrap_or(1.0);
                f64_at(discounts, row).is_some_and(|d| d > value)
            })
            .count()
    } else {
        0
    };
    if excessive > 0 {
        warnings.push(DataQualityWarning {
            check: QualityCheck::ExcessiveDiscount,
            count: excessive,
            message: "discounts exceeding the line value".into(),
        });
    }
    Ok(())
}
