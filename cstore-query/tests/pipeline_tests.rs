//! Pipeline behavior over in-memory snapshot fixtures.

use cstore_model::{
    BeverageFilter, DateRange, PaymentClass, PaymentFilter, StoreSelection, TopProductsFilter,
};
use cstore_query::{beverage_brands, payment_comparison, top_products};
use cstore_test_utils::{micros, ItemRow, PaymentRow, ProductRow, SetRow, SnapshotFixture};
use time::macros::date;

fn item(
    item_id: &'static str,
    set_id: &'static str,
    gtin: i64,
    day: (i32, u8, u8),
    quantity: f64,
    amount: f64,
) -> ItemRow {
    ItemRow {
        item_id,
        set_id,
        store_id: "101",
        gtin: Some(gtin),
        scan_type: "GTIN",
        micros: micros(day.0, day.1, day.2),
        unit_price: amount / quantity.max(1.0),
        quantity,
        amount,
    }
}

fn set(set_id: &'static str, day: (i32, u8, u8), grand_total: f64) -> SetRow {
    SetRow {
        set_id,
        store_id: "101",
        micros: micros(day.0, day.1, day.2),
        subtotal: grand_total,
        tax: 0.0,
        grand_total,
    }
}

/// Two stores, one product selling 100 units/week and another 50 units/week
/// over a four-week window, plus fuel that must never rank.
fn four_week_fixture() -> SnapshotFixture {
    let mut fixture = SnapshotFixture::two_stores();
    fixture.products = vec![
        ProductRow::new(100, "Cola 12oz", "Packaged Beverages"),
        ProductRow::new(200, "Candy Bar", "Snacks"),
        ProductRow::new(900, "Unleaded 87", "Fuel"),
    ];
    // Four ISO weeks of January 2024, one basket per product per week.
    let days: [(i32, u8, u8); 4] = [(2024, 1, 1), (2024, 1, 8), (2024, 1, 15), (2024, 1, 22)];
    let set_ids = ["t-1", "t-2", "t-3", "t-4"];
    let cola_items = ["c-1", "c-2", "c-3", "c-4"];
    let candy_items = ["k-1", "k-2", "k-3", "k-4"];
    let fuel_items = ["f-1", "f-2", "f-3", "f-4"];
    for i in 0..4 {
        fixture.sets.push(set(set_ids[i], days[i], 400.0));
        fixture
            .items
            .push(item(cola_items[i], set_ids[i], 100, days[i], 100.0, 200.0));
        fixture
            .items
            .push(item(candy_items[i], set_ids[i], 200, days[i], 50.0, 75.0));
        fixture
            .items
            .push(item(fuel_items[i], set_ids[i], 900, days[i], 30.0, 120.0));
    }
    fixture
}

#[test]
fn ranks_the_higher_volume_product_first_over_four_weeks() {
    let snapshot = four_week_fixture().build();
    let filter = TopProductsFilter {
        date_range: DateRange::days(date!(2024 - 01 - 01), date!(2024 - 01 - 28)),
        ..TopProductsFilter::default()
    };
    let report = top_products(&snapshot, &filter).unwrap();

    assert_eq!(report.rows.len(), 2, "fuel must not rank");
    assert_eq!(report.rows[0].gtin, 100);
    assert_eq!(report.rows[0].quantity, 400.0);
    assert_eq!(report.rows[1].gtin, 200);
    // One weekly row per product per ISO week.
    assert_eq!(report.weekly.len(), 8);
    assert_eq!(report.kpis.total_revenue, 4.0 * 275.0);
}

#[test]
fn never_returns_more_than_the_limit_and_never_fuel() {
    let snapshot = four_week_fixture().build();
    let report = top_products(&snapshot, &TopProductsFilter::default()).unwrap();
    assert!(report.rows.len() <= 5);
    for row in &report.rows {
        assert_ne!(row.gtin, 900);
        assert!(!row
            .category
            .as_deref()
            .is_some_and(|c| c.to_ascii_lowercase().contains("fuel")));
    }
}

#[test]
fn ranking_is_reproducible() {
    let snapshot = four_week_fixture().build();
    let filter = TopProductsFilter::default();
    let first = top_products(&snapshot, &filter).unwrap();
    let second = top_products(&snapshot, &filter).unwrap();
    let gtins = |r: &cstore_query::TopProductsReport| {
        r.rows.iter().map(|row| row.gtin).collect::<Vec<_>>()
    };
    assert_eq!(gtins(&first), gtins(&second));
    let weekly = |r: &cstore_query::TopProductsReport| {
        r.weekly
            .iter()
            .map(|w| (w.gtin, w.iso_year, w.iso_week))
            .collect::<Vec<_>>()
    };
    assert_eq!(weekly(&first), weekly(&second));
}

#[test]
fn fewer_qualifying_products_are_not_padded() {
    let snapshot = four_week_fixture().build();
    let filter = TopProductsFilter {
        stores: StoreSelection::Only(vec!["101".into()]),
        ..TopProductsFilter::default()
    };
    let report = top_products(&snapshot, &filter).unwrap();
    assert_eq!(report.rows.len(), 2);
}

#[test]
fn revenue_ties_break_by_gtin_ascending() {
    let mut fixture = SnapshotFixture::two_stores();
    fixture.products = vec![
        ProductRow::new(300, "Chips", "Snacks"),
        ProductRow::new(100, "Cola 12oz", "Packaged Beverages"),
    ];
    fixture.sets = vec![set("t-1", (2024, 2, 1), 20.0)];
    fixture.items = vec![
        item("i-1", "t-1", 300, (2024, 2, 1), 2.0, 10.0),
        item("i-2", "t-1", 100, (2024, 2, 1), 2.0, 10.0),
    ];
    let report = top_products(&fixture.build(), &TopProductsFilter::default()).unwrap();
    assert_eq!(report.rows[0].gtin, 100);
    assert_eq!(report.rows[1].gtin, 300);
}

fn beverage_fixture() -> SnapshotFixture {
    let mut fixture = SnapshotFixture::two_stores();
    fixture.products = vec![
        ProductRow {
            brand: Some("Alpine"),
            ..ProductRow::new(1, "Alpine Water", "Packaged Beverages")
        },
        ProductRow {
            brand: Some("Bolt"),
            ..ProductRow::new(2, "Bolt Energy", "Packaged Beverages")
        },
        ProductRow {
            brand: Some("Crisp"),
            ..ProductRow::new(3, "Crisp Soda", "Packaged Beverages")
        },
        ProductRow::new(4, "Candy Bar", "Snacks"),
    ];
    fixture.sets = vec![set("t-1", (2024, 3, 1), 100.0)];
    fixture.items = vec![
        item("i-1", "t-1", 1, (2024, 3, 1), 5.0, 10.0),
        item("i-2", "t-1", 2, (2024, 3, 1), 5.0, 30.0),
        item("i-3", "t-1", 3, (2024, 3, 1), 5.0, 20.0),
        item("i-4", "t-1", 4, (2024, 3, 1), 5.0, 99.0),
    ];
    fixture
}

#[test]
fn beverage_ranking_is_ascending_by_revenue_and_excludes_non_beverages() {
    let report = beverage_brands(&beverage_fixture().build(), &BeverageFilter::default()).unwrap();
    let brands: Vec<_> = report.rows.iter().map(|r| r.brand.as_str()).collect();
    assert_eq!(brands, vec!["Alpine", "Crisp", "Bolt"]);
    assert_eq!(report.kpis.brand_count, 3);
    assert_eq!(report.kpis.drop_candidates, 1);
    assert_eq!(report.kpis.drop_revenue, 10.0);
}

#[test]
fn ranking_is_independent_of_excluded_brands() {
    let full = beverage_brands(&beverage_fixture().build(), &BeverageFilter::default()).unwrap();

    // Drop the lowest-ranked brand's product and re-run.
    let mut reduced = beverage_fixture();
    reduced.items.retain(|i| i.gtin != Some(1));
    let rerun = beverage_brands(&reduced.build(), &BeverageFilter::default()).unwrap();

    let full_order: Vec<_> = full
        .rows
        .iter()
        .skip(1)
        .map(|r| r.brand.clone())
        .collect();
    let rerun_order: Vec<_> = rerun.rows.iter().map(|r| r.brand.clone()).collect();
    assert_eq!(full_order, rerun_order);
}

fn payment_fixture() -> SnapshotFixture {
    let mut fixture = SnapshotFixture::two_stores();
    fixture.products = vec![
        ProductRow::new(100, "Cola 12oz", "Packaged Beverages"),
        ProductRow::new(200, "Candy Bar", "Snacks"),
    ];
    fixture.sets = vec![
        set("t-cash", (2024, 4, 1), 12.0),
        set("t-card", (2024, 4, 1), 30.0),
        set("t-mystery", (2024, 4, 2), 7.0),
    ];
    fixture.items = vec![
        item("i-1", "t-cash", 100, (2024, 4, 1), 2.0, 4.0),
        item("i-2", "t-cash", 200, (2024, 4, 1), 4.0, 8.0),
        item("i-3", "t-card", 100, (2024, 4, 1), 10.0, 30.0),
        item("i-4", "t-mystery", 200, (2024, 4, 2), 3.5, 7.0),
    ];
    fixture.payments = vec![
        PaymentRow {
            set_id: "t-cash",
            store_id: "101",
            payment_type: Some("CASH"),
        },
        PaymentRow {
            set_id: "t-card",
            store_id: "101",
            payment_type: Some("credit"),
        },
        // t-mystery has no payment row at all.
    ];
    fixture
}

#[test]
fn item_counts_partition_across_classes() {
    let report = payment_comparison(&payment_fixture().build(), &PaymentFilter::default()).unwrap();
    let total_items: i64 = report.classes.iter().map(|c| c.item_count).sum();
    assert_eq!(total_items, 4);
    assert_eq!(report.class(PaymentClass::Cash).item_count, 2);
    assert_eq!(report.class(PaymentClass::Credit).item_count, 1);
    assert_eq!(report.class(PaymentClass::Other).item_count, 0);
    assert_eq!(report.class(PaymentClass::Unknown).item_count, 1);
}

#[test]
fn missing_payment_rows_classify_as_unknown_not_credit_or_cash() {
    let report = payment_comparison(&payment_fixture().build(), &PaymentFilter::default()).unwrap();
    let unknown = report.class(PaymentClass::Unknown);
    assert_eq!(unknown.transaction_count, 1);
    assert_eq!(unknown.total_amount, 7.0);
    assert_eq!(report.class(PaymentClass::Cash).transaction_count, 1);
    assert_eq!(report.class(PaymentClass::Credit).transaction_count, 1);
}

#[test]
fn per_class_top_products_count_line_items() {
    let report = payment_comparison(&payment_fixture().build(), &PaymentFilter::default()).unwrap();
    let cash = report.class(PaymentClass::Cash);
    assert_eq!(cash.top_products.len(), 2);
    // Both products have one purchase; GTIN ascending breaks the tie.
    assert_eq!(cash.top_products[0].gtin, Some(100));
    assert_eq!(
        cash.top_products[0].description.as_deref(),
        Some("Cola 12oz")
    );
}

#[test]
fn date_scope_applies_to_sets_and_their_items() {
    let report = payment_comparison(
        &payment_fixture().build(),
        &PaymentFilter {
            date_range: DateRange::days(date!(2024 - 04 - 02), date!(2024 - 04 - 02)),
            stores: StoreSelection::All,
        },
    )
    .unwrap();
    let total_items: i64 = report.classes.iter().map(|c| c.item_count).sum();
    assert_eq!(total_items, 1);
    assert_eq!(report.class(PaymentClass::Unknown).item_count, 1);
}
