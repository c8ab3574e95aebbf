//! Q1: top products by weekly sales, fuel excluded.

use arrow::record_batch::RecordBatch;
use cstore_model::batch::{f64_at, f64_col, i64_at, i64_col, str_at, str_col, ts_at, ts_col};
use cstore_model::category::is_fuel_category;
use cstore_model::schema::col;
use cstore_model::TopProductsFilter;
use cstore_load::Snapshot;
use cstore_result::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::date::IsoWeek;
use crate::index::{opt_str, ProductIndex};
use crate::scope::Scope;

/// One ranked product with its totals over the filtered window.
#[derive(Clone, Debug, Serialize)]
pub struct TopProductRow {
    pub gtin: i64,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub revenue: f64,
    pub quantity: f64,
    pub transactions: i64,
}

/// Per-week sales for one of the ranked products, for the trend view.
#[derive(Clone, Debug, Serialize)]
pub struct WeeklyProductRow {
    pub gtin: i64,
    pub iso_year: i32,
    pub iso_week: u8,
    pub revenue: f64,
    pub quantity: f64,
    pub transactions: i64,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct TopProductsKpis {
    pub total_revenue: f64,
    pub total_quantity: f64,
    pub total_transactions: i64,
    pub avg_revenue_per_product: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TopProductsReport {
    pub rows: Vec<TopProductRow>,
    pub weekly: Vec<WeeklyProductRow>,
    pub kpis: TopProductsKpis,
}

#[derive(Default)]
struct WeekAgg {
    revenue: f64,
    quantity: f64,
    transactions: i64,
}

#[derive(Default)]
struct ProductMeta {
    description: Option<String>,
    brand: Option<String>,
    category: Option<String>,
}

#[derive(Default)]
struct WeeklyAggregator {
    weeks: FxHashMap<(i64, IsoWeek), WeekAgg>,
    meta: FxHashMap<i64, ProductMeta>,
}

impl WeeklyAggregator {
    fn add(
        &mut self,
        gtin: i64,
        week: IsoWeek,
        revenue: f64,
        quantity: f64,
        transactions: i64,
    ) {
        let agg = self.weeks.entry((gtin, week)).or_default();
        agg.revenue += revenue;
        agg.quantity += quantity;
        agg.transactions += transactions;
    }

    fn note_meta(
        &mut self,
        gtin: i64,
        description: Option<String>,
        brand: Option<String>,
        category: Option<String>,
    ) {
        let meta = self.meta.entry(gtin).or_default();
        if meta.description.is_none() {
            meta.description = description;
        }
        if meta.brand.is_none() {
            meta.brand = brand;
        }
        if meta.category.is_none() {
            meta.category = category;
        }
    }
}

/// Rank products by summed weekly revenue over the filtered window.
///
/// Prefers the pre-rolled daily aggregate when the snapshot carries one and
/// falls back to line-item aggregation otherwise; both paths feed the same
/// weekly rollup. Rows whose product category classifies as fuel are
/// excluded; rows with no category at all stay in (the unknown bucket).
/// Ranking is revenue descending with GTIN ascending as the tie-break, so a
/// re-run with identical parameters returns identical order.
pub fn top_products(snapshot: &Snapshot, filter: &TopProductsFilter) -> Result<TopProductsReport> {
    let scope = Scope::new(&filter.date_range, &filter.stores)?;
    let products = ProductIndex::build(&snapshot.products)?;

    let mut agg = WeeklyAggregator::default();
    match &snapshot.daily_agg {
        Some(daily) => aggregate_daily(daily, &products, &scope, &mut agg)?,
        None => aggregate_items(&snapshot.transaction_items, &products, &scope, &mut agg)?,
    }

    // Roll weekly cells up to per-product totals.
    let mut totals: FxHashMap<i64, WeekAgg> = FxHashMap::default();
    for ((gtin, _), cell) in &agg.weeks {
        let total = totals.entry(*gtin).or_default();
        total.revenue += cell.revenue;
        total.quantity += cell.quantity;
        total.transactions += cell.transactions;
    }

    let mut ranked: Vec<(i64, WeekAgg)> = totals.into_iter().collect();
    ranked.sort_by(|(gtin_a, a), (gtin_b, b)| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| gtin_a.cmp(gtin_b))
    });
    ranked.truncate(filter.limit);

    let winners: FxHashSet<i64> = ranked.iter().map(|(gtin, _)| *gtin).collect();
    let rows: Vec<TopProductRow> = ranked
        .into_iter()
        .map(|(gtin, total)| {
            let meta = agg.meta.get(&gtin);
            TopProductRow {
                gtin,
                description: meta.and_then(|m| m.description.clone()),
                brand: meta.and_then(|m| m.brand.clone()),
                category: meta.and_then(|m| m.category.clone()),
                revenue: total.revenue,
                quantity: total.quantity,
                transactions: total.transactions,
            }
        })
        .collect();

    let mut weekly: Vec<WeeklyProductRow> = agg
        .weeks
        .iter()
        .filter(|((gtin, _), _)| winners.contains(gtin))
        .map(|((gtin, week), cell)| WeeklyProductRow {
            gtin: *gtin,
            iso_year: week.year,
            iso_week: week.week,
            revenue: cell.revenue,
            quantity: cell.quantity,
            transactions: cell.transactions,
        })
        .collect();
    weekly.sort_by_key(|row| (row.iso_year, row.iso_week, row.gtin));

    let kpis = TopProductsKpis {
        total_revenue: rows.iter().map(|r| r.revenue).sum(),
        total_quantity: rows.iter().map(|r| r.quantity).sum(),
        total_transactions: rows.iter().map(|r| r.transactions).sum(),
        avg_revenue_per_product: if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.revenue).sum::<f64>() / rows.len() as f64
        },
    };

    tracing::debug!(products = rows.len(), weeks = weekly.len(), "top products ranked");
    Ok(TopProductsReport { rows, weekly, kpis })
}

fn aggregate_daily(
    daily: &RecordBatch,
    products: &ProductIndex,
    scope: &Scope<'_>,
    agg: &mut WeeklyAggregator,
) -> Result<()> {
    let store_ids = str_col(daily, col::STORE_ID)?;
    let gtins = i64_col(daily, col::GTIN)?;
    let dates = ts_col(daily, col::DATE)?;
    let quantities = f64_col(daily, col::QUANTITY)?;
    let revenues = f64_col(daily, col::TOTAL_REVENUE_AMOUNT)?;
    let transactions = i64_col(daily, col::TRANSACTION_COUNT)?;
    let categories = opt_str(daily, col::CATEGORY)?;
    let brands = opt_str(daily, col::BRAND)?;
    let descriptions = opt_str(daily, col::SKUPOS_DESCRIPTION)?;

    for row in 0..daily.num_rows() {
        if !scope.keep(str_at(store_ids, row), ts_at(dates, row)) {
            continue;
        }
        let Some(gtin) = i64_at(gtins, row) else {
            continue;
        };
        let info = products.get(gtin);

        // Master-first coalesce, aggregate-table fallback.
        let category = info
            .and_then(|p| p.category.clone())
            .or_else(|| categories.value_at(row));
        if is_fuel_category(category.as_deref()) {
            continue;
        }

        let Some(ts) = ts_at(dates, row) else {
            continue;
        };
        let week = IsoWeek::from_micros(ts)?;
        agg.add(
            gtin,
            week,
            f64_at(revenues, row).unwrap_or(0.0),
            f64_at(quantities, row).unwrap_or(0.0),
            i64_at(transactions, row).unwrap_or(0),
        );
        agg.note_meta(
            gtin,
            info.and_then(|p| p.description.clone())
                .or_else(|| descriptions.value_at(row)),
            info.and_then(|p| p.brand.clone())
                .or_else(|| brands.value_at(row)),
            category,
        );
    }
    Ok(())
}

fn aggregate_items(
    items: &RecordBatch,
    products: &ProductIndex,
    scope: &Scope<'_>,
    agg: &mut WeeklyAggregator,
) -> Result<()> {
    let store_ids = str_col(items, col::STORE_ID)?;
    let set_ids = str_col(items, col::TRANSACTION_SET_ID)?;
    let gtins = i64_col(items, col::GTIN)?;
    let dates = ts_col(items, col::DATE_TIME)?;
    let quantities = f64_col(items, col::UNIT_QUANTITY)?;
    let amounts = f64_col(items, col::GRAND_TOTAL_AMOUNT)?;

    // Transaction counts at item level are distinct baskets per product-week.
    let mut baskets: FxHashMap<(i64, IsoWeek), FxHashSet<String>> = FxHashMap::default();

    for row in 0..items.num_rows() {
        if !scope.keep(str_at(store_ids, row), ts_at(dates, row)) {
            continue;
        }
        let Some(gtin) = i64_at(gtins, row) else {
            continue;
        };
        let info = products.get(gtin);
        let category = info.and_then(|p| p.category.clone());
        if is_fuel_category(category.as_deref()) {
            continue;
        }

        let Some(ts) = ts_at(dates, row) else {
            continue;
        };
        let week = IsoWeek::from_micros(ts)?;
        agg.add(
            gtin,
            week,
            f64_at(amounts, row).unwrap_or(0.0),
            f64_at(quantities, row).unwrap_or(0.0),
            0,
        );
        if let Some(set_id) = str_at(set_ids, row) {
            baskets
                .entry((gtin, week))
                .or_default()
                .insert(set_id.to_owned());
        }
        agg.note_meta(
            gtin,
            info.and_then(|p| p.description.clone()),
            info.and_then(|p| p.brand.clone()),
            category,
        );
    }

    for (key, set_ids) in baskets {
        if let Some(cell) = agg.weeks.get_mut(&key) {
            cell.transactions = set_ids.len() as i64;
        }
    }
    Ok(())
}
