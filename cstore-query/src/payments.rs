//! Q3: cash vs credit comparison as parallel per-class aggregates.

use cstore_model::batch::{f64_at, f64_col, i64_at, i64_col, str_at, str_col, ts_at, ts_col};
use cstore_model::schema::col;
use cstore_model::{PaymentClass, PaymentFilter};
use cstore_load::Snapshot;
use cstore_result::Result;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::index::{PaymentClassIndex, ProductIndex};
use crate::scope::Scope;

const TOP_PRODUCTS_PER_CLASS: usize = 10;

/// One product's purchase counts within a payment class.
#[derive(Clone, Debug, Serialize)]
pub struct ProductPurchaseRow {
    /// `None` for non-scanned line items, which have no product identity.
    pub gtin: Option<i64>,
    pub description: Option<String>,
    pub purchases: i64,
    pub revenue: f64,
    pub quantity: f64,
}

/// Aggregates for one payment class.
///
/// Classes are reported in parallel, one summary each, rather than merged
/// into a single table; `Unknown` is always its own entry.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentClassSummary {
    pub class: PaymentClass,
    pub transaction_count: i64,
    pub total_amount: f64,
    pub avg_transaction_amount: f64,
    pub item_count: i64,
    pub total_quantity: f64,
    pub top_products: Vec<ProductPurchaseRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentComparisonReport {
    /// One summary per class, in `Cash, Credit, Other, Unknown` order,
    /// including zero-row classes.
    pub classes: Vec<PaymentClassSummary>,
}

impl PaymentComparisonReport {
    pub fn class(&self, class: PaymentClass) -> &PaymentClassSummary {
        // The constructor emits all four classes.
        self.classes
            .iter()
            .find(|s| s.class == class)
            .expect("all payment classes present")
    }
}

#[derive(Default)]
struct ClassAgg {
    transaction_count: i64,
    total_amount: f64,
    item_count: i64,
    total_quantity: f64,
    products: FxHashMap<Option<i64>, ProductAgg>,
}

#[derive(Default)]
struct ProductAgg {
    purchases: i64,
    revenue: f64,
    quantity: f64,
}

/// Compare payment classes over the filtered window.
///
/// Every transaction set in scope is classified through the payments table
/// and lands in exactly one class; its line items follow it. Item counts
/// across the four classes therefore partition the filtered item total.
pub fn payment_comparison(
    snapshot: &Snapshot,
    filter: &PaymentFilter,
) -> Result<PaymentComparisonReport> {
    let scope = Scope::new(&filter.date_range, &filter.stores)?;
    let products = ProductIndex::build(&snapshot.products)?;
    let payment_index = PaymentClassIndex::build(&snapshot.payments)?;

    let mut aggs: FxHashMap<PaymentClass, ClassAgg> = FxHashMap::default();
    for class in PaymentClass::ALL {
        aggs.insert(class, ClassAgg::default());
    }

    // Classify the baskets in scope.
    let sets = &snapshot.transaction_sets;
    let set_ids = str_col(sets, col::TRANSACTION_SET_ID)?;
    let set_stores = str_col(sets, col::STORE_ID)?;
    let set_dates = ts_col(sets, col::DATE_TIME)?;
    let set_totals = f64_col(sets, col::GRAND_TOTAL_AMOUNT)?;

    let mut class_by_set: FxHashMap<String, PaymentClass> = FxHashMap::default();
    for row in 0..sets.num_rows() {
        if !scope.keep(str_at(set_stores, row), ts_at(set_dates, row)) {
            continue;
        }
        let Some(set_id) = str_at(set_ids, row) else {
            continue;
        };
        let class = payment_index.classify(set_id);
        class_by_set.insert(set_id.to_owned(), class);

        let agg = aggs.entry(class).or_default();
        agg.transaction_count += 1;
        agg.total_amount += f64_at(set_totals, row).unwrap_or(0.0);
    }

    // Line items follow their basket's class.
    let items = &snapshot.transaction_items;
    let item_set_ids = str_col(items, col::TRANSACTION_SET_ID)?;
    let item_gtins = i64_col(items, col::GTIN)?;
    let item_quantities = f64_col(items, col::UNIT_QUANTITY)?;
    let item_amounts = f64_col(items, col::GRAND_TOTAL_AMOUNT)?;

    for row in 0..items.num_rows() {
        let Some(class) = str_at(item_set_ids, row).and_then(|id| class_by_set.get(id)) else {
            continue;
        };
        let agg = aggs.entry(*class).or_default();
        agg.item_count += 1;
        agg.total_quantity += f64_at(item_quantities, row).unwrap_or(0.0);

        let product = agg.products.entry(i64_at(item_gtins, row)).or_default();
        product.purchases += 1;
        product.revenue += f64_at(item_amounts, row).unwrap_or(0.0);
        product.quantity += f64_at(item_quantities, row).unwrap_or(0.0);
    }

    let classes = PaymentClass::ALL
        .into_iter()
        .map(|class| {
            let agg = aggs.remove(&class).unwrap_or_default();
            summarize(class, agg, &products)
        })
        .collect();

    tracing::debug!(baskets = class_by_set.len(), "payment classes compared");
    Ok(PaymentComparisonReport { classes })
}

fn summarize(
    class: PaymentClass,
    agg: ClassAgg,
    products: &ProductIndex,
) -> PaymentClassSummary {
    let mut top: Vec<(Option<i64>, ProductAgg)> = agg.products.into_iter().collect();
    top.sort_by(|(gtin_a, a), (gtin_b, b)| {
        b.purchases
            .cmp(&a.purchases)
            .then_with(|| gtin_key(*gtin_a).cmp(&gtin_key(*gtin_b)))
    });
    top.truncate(TOP_PRODUCTS_PER_CLASS);

    let top_products = top
        .into_iter()
        .map(|(gtin, product)| ProductPurchaseRow {
            gtin,
            description: gtin
                .and_then(|g| products.get(g))
                .and_then(|p| p.description.clone()),
            purchases: product.purchases,
            revenue: product.revenue,
            quantity: product.quantity,
        })
        .collect();

    PaymentClassSummary {
        class,
        transaction_count: agg.transaction_count,
        total_amount: agg.total_amount,
        avg_transaction_amount: if agg.transaction_count == 0 {
            0.0
        } else {
            agg.total_amount / agg.transaction_count as f64
        },
        item_count: agg.item_count,
        total_quantity: agg.total_quantity,
        top_products,
    }
}

/// Order product buckets deterministically: real GTINs ascending, the
/// non-scanned bucket last.
fn gtin_key(gtin: Option<i64>) -> (u8, i64) {
    match gtin {
        Some(g) => (0, g),
        None => (1, 0),
    }
}
