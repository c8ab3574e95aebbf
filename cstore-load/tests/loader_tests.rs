//! End-to-end loader tests over on-disk Parquet fixtures.

use arrow::array::Array;
use cstore_load::{LoadOptions, Loader};
use cstore_model::batch::str_col;
use cstore_model::schema::col;
use cstore_result::Error;
use cstore_test_utils::{micros, ItemRow, PaymentRow, SetRow, SnapshotFixture, StoreRow};
use tempfile::TempDir;

fn fixture_with_transactions() -> SnapshotFixture {
    let mut fixture = SnapshotFixture::two_stores();
    fixture.sets = vec![
        SetRow {
            set_id: "t-1",
            store_id: "101",
            micros: micros(2024, 1, 2),
            subtotal: 10.0,
            tax: 0.6,
            grand_total: 10.6,
        },
        // Orphan: no store "999" exists anywhere.
        SetRow {
            set_id: "t-9",
            store_id: "999",
            micros: micros(2024, 1, 2),
            subtotal: 5.0,
            tax: 0.3,
            grand_total: 5.3,
        },
    ];
    fixture.items = vec![
        ItemRow {
            item_id: "i-1",
            set_id: "t-1",
            store_id: "101",
            gtin: Some(100),
            scan_type: "GTIN",
            micros: micros(2024, 1, 2),
            unit_price: 2.0,
            quantity: 5.0,
            amount: 10.0,
        },
        // Belongs to the orphaned basket; must fall out with it.
        ItemRow {
            item_id: "i-9",
            set_id: "t-9",
            store_id: "101",
            gtin: Some(100),
            scan_type: "GTIN",
            micros: micros(2024, 1, 2),
            unit_price: 1.0,
            quantity: 1.0,
            amount: 1.0,
        },
    ];
    fixture.payments = vec![PaymentRow {
        set_id: "t-1",
        store_id: "101",
        payment_type: Some("cash"),
    }];
    fixture
}

#[test]
fn loads_and_filters_a_two_store_snapshot() {
    let dir = TempDir::new().unwrap();
    fixture_with_transactions().write_data_dir(dir.path());

    let snapshot = Loader::new(LoadOptions::new(dir.path())).load().unwrap();
    assert_eq!(snapshot.stores.num_rows(), 2);
    assert_eq!(snapshot.transaction_sets.num_rows(), 1);
    assert_eq!(snapshot.transaction_items.num_rows(), 1);
    assert_eq!(snapshot.orphans.transaction_sets, 1);
    assert_eq!(snapshot.orphans.transaction_items_set, 1);
    assert!(snapshot.daily_agg.is_none());
}

#[test]
fn allowlist_bounds_the_working_set() {
    let dir = TempDir::new().unwrap();
    fixture_with_transactions().write_data_dir(dir.path());

    let options = LoadOptions::new(dir.path()).with_allowlist(vec!["rexburg".into()]);
    let snapshot = Loader::new(options).load().unwrap();

    let ids = str_col(&snapshot.stores, col::STORE_ID).unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids.value(0), "102");
    // Store 101's transactions are out of scope, not orphans.
    assert_eq!(snapshot.transaction_sets.num_rows(), 0);
    assert_eq!(snapshot.orphans.transaction_sets, 1);
}

#[test]
fn allowlist_matching_nothing_is_an_argument_error() {
    let dir = TempDir::new().unwrap();
    fixture_with_transactions().write_data_dir(dir.path());

    let options = LoadOptions::new(dir.path()).with_allowlist(vec!["boise".into()]);
    let err = Loader::new(options).load().unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentError(_)));
}

#[test]
fn duplicate_store_records_keep_the_later_timestamp() {
    let dir = TempDir::new().unwrap();
    let mut fixture = fixture_with_transactions();
    fixture.stores.push(StoreRow {
        id: "101",
        name: "Rigby Quickstop (new owner)",
        address: "101 Main St",
        updated_micros: micros(2024, 6, 1),
        ..StoreRow::default()
    });
    fixture.write_data_dir(dir.path());

    let snapshot = Loader::new(LoadOptions::new(dir.path())).load().unwrap();
    assert_eq!(snapshot.stores.num_rows(), 2);
    assert_eq!(snapshot.deduplicated_stores, 1);

    let names = str_col(&snapshot.stores, col::STORE_NAME).unwrap();
    let ids = str_col(&snapshot.stores, col::STORE_ID).unwrap();
    let kept: Vec<_> = (0..2).map(|i| (ids.value(i), names.value(i))).collect();
    assert!(kept.contains(&("101", "Rigby Quickstop (new owner)")));
}

#[test]
fn missing_required_file_is_a_data_source_error() {
    let dir = TempDir::new().unwrap();
    fixture_with_transactions().write_data_dir(dir.path());
    std::fs::remove_file(dir.path().join("cstore_payments.parquet")).unwrap();

    let err = Loader::new(LoadOptions::new(dir.path())).load().unwrap_err();
    assert!(matches!(err, Error::DataSource(_)));
}
