//! Q2: packaged-beverage brands ranked for removal.

use arrow::record_batch::RecordBatch;
use cstore_model::batch::{f64_at, f64_col, i64_at, i64_col, str_at, str_col, ts_at, ts_col};
use cstore_model::category::{bucket, is_beverage_category};
use cstore_model::schema::col;
use cstore_model::{BeverageFilter, DropMetric};
use cstore_load::Snapshot;
use cstore_result::Result;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::index::{opt_str, ProductIndex};
use crate::scope::Scope;

/// One brand's performance over the filtered window.
#[derive(Clone, Debug, Serialize)]
pub struct BrandRow {
    pub brand: String,
    pub manufacturer: Option<String>,
    pub revenue: f64,
    pub quantity: f64,
    pub transactions: i64,
}

impl BrandRow {
    fn metric(&self, metric: DropMetric) -> f64 {
        match metric {
            DropMetric::Revenue => self.revenue,
            DropMetric::Quantity => self.quantity,
            DropMetric::Transactions => self.transactions as f64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct BrandKpis {
    pub brand_count: usize,
    pub total_revenue: f64,
    pub avg_revenue_per_brand: f64,
    /// How many of the lowest-ranked brands fall in the bottom fifth.
    pub drop_candidates: usize,
    /// Revenue that would be lost by dropping those candidates.
    pub drop_revenue: f64,
}

/// Brands in ascending order of the drop metric: the first row is the
/// strongest candidate for removal.
#[derive(Clone, Debug, Serialize)]
pub struct BrandRankingReport {
    pub rows: Vec<BrandRow>,
    pub metric: DropMetric,
    pub kpis: BrandKpis,
}

#[derive(Default)]
struct BrandAgg {
    manufacturer: Option<String>,
    revenue: f64,
    quantity: f64,
    transactions: i64,
}

/// Rank packaged-beverage brands ascending by the configured drop metric.
///
/// Classification checks category and subcategory, master-first with the
/// aggregate table's columns as fallback. A null brand lands in the
/// "Unknown" bucket and is ranked like any other brand. Ties order by brand
/// name, so the ranking is stable across runs and unaffected by which other
/// brands are present.
pub fn beverage_brands(snapshot: &Snapshot, filter: &BeverageFilter) -> Result<BrandRankingReport> {
    let scope = Scope::new(&filter.date_range, &filter.stores)?;
    let products = ProductIndex::build(&snapshot.products)?;

    let mut brands: FxHashMap<String, BrandAgg> = FxHashMap::default();
    match &snapshot.daily_agg {
        Some(daily) => {
            aggregate_daily(daily, &products, &scope, filter, &mut brands)?;
        }
        None => aggregate_items(&snapshot.transaction_items, &products, &scope, filter, &mut brands)?,
    }

    let mut rows: Vec<BrandRow> = brands
        .into_iter()
        .map(|(brand, agg)| BrandRow {
            brand,
            manufacturer: agg.manufacturer,
            revenue: agg.revenue,
            quantity: agg.quantity,
            transactions: agg.transactions,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.metric(filter.drop_metric)
            .total_cmp(&b.metric(filter.drop_metric))
            .then_with(|| a.brand.cmp(&b.brand))
    });

    let brand_count = rows.len();
    let total_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
    // Bottom fifth of the ascending ranking, at least one brand when any exist.
    let drop_candidates = if brand_count == 0 {
        0
    } else {
        (brand_count as f64 / 5.0).ceil() as usize
    };
    let drop_revenue = rows.iter().take(drop_candidates).map(|r| r.revenue).sum();

    let kpis = BrandKpis {
        brand_count,
        total_revenue,
        avg_revenue_per_brand: if brand_count == 0 {
            0.0
        } else {
            total_revenue / brand_count as f64
        },
        drop_candidates,
        drop_revenue,
    };

    tracing::debug!(brands = brand_count, metric = %filter.drop_metric, "beverage brands ranked");
    Ok(BrandRankingReport {
        rows,
        metric: filter.drop_metric,
        kpis,
    })
}

struct ResolvedProduct {
    brand: String,
    manufacturer: Option<String>,
}

fn resolve(
    products: &ProductIndex,
    gtin: i64,
    fallback_category: Option<&str>,
    fallback_brand: Option<&str>,
    filter: &BeverageFilter,
) -> Option<ResolvedProduct> {
    let info = products.get(gtin);
    let category = info
        .and_then(|p| p.category.as_deref())
        .or(fallback_category);
    let subcategory = info.and_then(|p| p.subcategory.as_deref());
    if !is_beverage_category(category, subcategory) {
        return None;
    }
    if let Some(selected) = &filter.categories {
        let category_name = bucket(category);
        if !selected.iter().any(|c| c == category_name) {
            return None;
        }
    }
    let brand = bucket(info.and_then(|p| p.brand.as_deref()).or(fallback_brand)).to_owned();
    Some(ResolvedProduct {
        brand,
        manufacturer: info.and_then(|p| p.manufacturer.clone()),
    })
}

fn aggregate_daily(
    daily: &RecordBatch,
    products: &ProductIndex,
    scope: &Scope<'_>,
    filter: &BeverageFilter,
    brands: &mut FxHashMap<String, BrandAgg>,
) -> Result<()> {
    let store_ids = str_col(daily, col::STORE_ID)?;
    let gtins = i64_col(daily, col::GTIN)?;
    let dates = ts_col(daily, col::DATE)?;
    let quantities = f64_col(daily, col::QUANTITY)?;
    let revenues = f64_col(daily, col::TOTAL_REVENUE_AMOUNT)?;
    let transactions = i64_col(daily, col::TRANSACTION_COUNT)?;
    let categories = opt_str(daily, col::CATEGORY)?;
    let fallback_brands = opt_str(daily, col::BRAND)?;

    for row in 0..daily.num_rows() {
        if !scope.keep(str_at(store_ids, row), ts_at(dates, row)) {
            continue;
        }
        let Some(gtin) = i64_at(gtins, row) else {
            continue;
        };
        let Some(resolved) = resolve(
            products,
            gtin,
            categories.str_at(row),
            fallback_brands.str_at(row),
            filter,
        ) else {
            continue;
        };
        let agg = brands.entry(resolved.brand).or_default();
        if agg.manufacturer.is_none() {
            agg.manufacturer = resolved.manufacturer;
        }
        agg.revenue += f64_at(revenues, row).unwrap_or(0.0);
        agg.quantity += f64_at(quantities, row).unwrap_or(0.0);
        agg.transactions += i64_at(transactions, row).unwrap_or(0);
    }
    Ok(())
}

fn aggregate_items(
    items: &RecordBatch,
    products: &ProductIndex,
    scope: &Scope<'_>,
    filter: &BeverageFilter,
    brands: &mut FxHashMap<String, BrandAgg>,
) -> Result<()> {
    let store_ids = str_col(items, col::STORE_ID)?;
    let set_ids = str_col(items, col::TRANSACTION_SET_ID)?;
    let gtins = i64_col(items, col::GTIN)?;
    let dates = ts_col(items, col::DATE_TIME)?;
    let quantities = f64_col(items, col::UNIT_QUANTITY)?;
    let amounts = f64_col(items, col::GRAND_TOTAL_AMOUNT)?;

    let mut baskets: FxHashMap<String, rustc_hash::FxHashSet<String>> = FxHashMap::default();

    for row in 0..items.num_rows() {
        if !scope.keep(str_at(store_ids, row), ts_at(dates, row)) {
            continue;
        }
        let Some(gtin) = i64_at(gtins, row) else {
            continue;
        };
        let Some(resolved) = resolve(products, gtin, None, None, filter) else {
            continue;
        };
        let brand = resolved.brand.clone();
        let agg = brands.entry(resolved.brand).or_default();
        if agg.manufacturer.is_none() {
            agg.manufacturer = resolved.manufacturer;
        }
        agg.revenue += f64_at(amounts, row).unwrap_or(0.0);
        agg.quantity += f64_at(quantities, row).unwrap_or(0.0);
        if let Some(set_id) = str_at(set_ids, row) {
            baskets.entry(brand).or_default().insert(set_id.to_owned());
        }
    }

    for (brand, set_ids) in baskets {
        if let Some(agg) = brands.get_mut(&brand) {
            agg.transactions = set_ids.len() as i64;
        }
    }
    Ok(())
}
