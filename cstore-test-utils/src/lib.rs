//! Snapshot fixtures shared by the CStore test suites.
//!
//! Builders here produce tables already in the loader's normalized shape
//! (Utf8 identifiers, Int64 GTINs, Float64 amounts, µs timestamps), so query
//! and validator tests can construct a [`Snapshot`] without touching disk.
//! [`write_data_dir`] writes the same fixture out as a Parquet data directory
//! for loader and cache tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use cstore_load::{OrphanCounts, Snapshot};
use cstore_model::schema::col;
use parquet::arrow::ArrowWriter;
use time::{Date, Month};

/// Epoch microseconds for midnight UTC on the given calendar day.
pub fn micros(year: i32, month: u8, day: u8) -> i64 {
    let month = Month::try_from(month).expect("valid month");
    let date = Date::from_calendar_date(year, month, day).expect("valid date");
    date.midnight().assume_utc().unix_timestamp() * 1_000_000
}

fn ts_field(name: &str) -> Field {
    Field::new(name, DataType::Timestamp(TimeUnit::Microsecond, None), true)
}

fn utf8(values: Vec<Option<String>>) -> Arc<StringArray> {
    Arc::new(StringArray::from(values))
}

#[derive(Clone, Debug)]
pub struct StoreRow {
    pub id: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub address: &'static str,
    pub zip: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub updated_micros: i64,
}

impl Default for StoreRow {
    fn default() -> Self {
        Self {
            id: "101",
            name: "Rigby Quickstop",
            city: "Rigby",
            address: "101 Main St",
            zip: "83442",
            lat: 43.672,
            lon: -111.915,
            updated_micros: micros(2024, 1, 1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProductRow {
    pub gtin: i64,
    pub description: Option<&'static str>,
    pub category: Option<&'static str>,
    pub subcategory: Option<&'static str>,
    pub brand: Option<&'static str>,
    pub manufacturer: Option<&'static str>,
}

impl ProductRow {
    pub fn new(gtin: i64, description: &'static str, category: &'static str) -> Self {
        Self {
            gtin,
            description: Some(description),
            category: Some(category),
            subcategory: None,
            brand: None,
            manufacturer: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SetRow {
    pub set_id: &'static str,
    pub store_id: &'static str,
    pub micros: i64,
    pub subtotal: f64,
    pub tax: f64,
    pub grand_total: f64,
}

#[derive(Clone, Debug)]
pub struct ItemRow {
    pub item_id: &'static str,
    pub set_id: &'static str,
    pub store_id: &'static str,
    pub gtin: Option<i64>,
    pub scan_type: &'static str,
    pub micros: i64,
    pub unit_price: f64,
    pub quantity: f64,
    pub amount: f64,
}

#[derive(Clone, Debug)]
pub struct PaymentRow {
    pub set_id: &'static str,
    pub store_id: &'static str,
    pub payment_type: Option<&'static str>,
}

#[derive(Clone, Debug)]
pub struct DailyRow {
    pub store_id: &'static str,
    pub gtin: i64,
    pub micros: i64,
    pub year: i64,
    pub week: i64,
    pub scan_type: &'static str,
    pub category: Option<&'static str>,
    pub brand: Option<&'static str>,
    pub description: Option<&'static str>,
    pub quantity: f64,
    pub revenue: f64,
    pub transactions: i64,
}

pub fn stores_batch(rows: &[StoreRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::STORE_ID, DataType::Utf8, true),
        Field::new(col::STORE_NAME, DataType::Utf8, true),
        Field::new(col::CHAIN_ID, DataType::Utf8, true),
        Field::new(col::CITY, DataType::Utf8, true),
        Field::new(col::STATE, DataType::Utf8, true),
        Field::new(col::STREET_ADDRESS, DataType::Utf8, true),
        Field::new(col::ZIP_CODE, DataType::Utf8, true),
        Field::new(col::LATITUDE, DataType::Float64, true),
        Field::new(col::LONGITUDE, DataType::Float64, true),
        ts_field(col::CREATED_AT),
        ts_field(col::UPDATED_AT),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(rows.iter().map(|r| Some(r.id.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.name.to_string())).collect()),
            utf8(rows.iter().map(|_| Some("1".to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.city.to_string())).collect()),
            utf8(rows.iter().map(|_| Some("ID".to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.address.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.zip.to_string())).collect()),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.lat)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.lon)).collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter()
                    .map(|r| Some(r.updated_micros))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter()
                    .map(|r| Some(r.updated_micros))
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("stores fixture")
}

pub fn products_batch(rows: &[ProductRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::GTIN, DataType::Int64, true),
        Field::new(col::SKUPOS_DESCRIPTION, DataType::Utf8, true),
        Field::new(col::CATEGORY, DataType::Utf8, true),
        Field::new(col::SUBCATEGORY, DataType::Utf8, true),
        Field::new(col::BRAND, DataType::Utf8, true),
        Field::new(col::MANUFACTURER, DataType::Utf8, true),
        Field::new(col::UNIT_SIZE, DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(
                rows.iter().map(|r| Some(r.gtin)).collect::<Vec<_>>(),
            )),
            utf8(rows
                .iter()
                .map(|r| r.description.map(str::to_owned))
                .collect()),
            utf8(rows.iter().map(|r| r.category.map(str::to_owned)).collect()),
            utf8(rows
                .iter()
                .map(|r| r.subcategory.map(str::to_owned))
                .collect()),
            utf8(rows.iter().map(|r| r.brand.map(str::to_owned)).collect()),
            utf8(rows
                .iter()
                .map(|r| r.manufacturer.map(str::to_owned))
                .collect()),
            utf8(rows.iter().map(|_| None).collect()),
        ],
    )
    .expect("products fixture")
}

pub fn sets_batch(rows: &[SetRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::TRANSACTION_SET_ID, DataType::Utf8, true),
        Field::new(col::STORE_ID, DataType::Utf8, true),
        ts_field(col::DATE_TIME),
        Field::new(col::POS_TYPE_ID, DataType::Int64, true),
        Field::new(col::SUBTOTAL_AMOUNT, DataType::Float64, true),
        Field::new(col::TAX_AMOUNT, DataType::Float64, true),
        Field::new(col::GRAND_TOTAL_AMOUNT, DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(rows.iter().map(|r| Some(r.set_id.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.store_id.to_string())).collect()),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter().map(|r| Some(r.micros)).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|_| Some(1)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.subtotal)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.tax)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.grand_total)).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("sets fixture")
}

pub fn items_batch(rows: &[ItemRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::TRANSACTION_ITEM_ID, DataType::Utf8, true),
        Field::new(col::TRANSACTION_SET_ID, DataType::Utf8, true),
        Field::new(col::STORE_ID, DataType::Utf8, true),
        Field::new(col::GTIN, DataType::Int64, true),
        Field::new(col::SCAN_TYPE, DataType::Utf8, true),
        ts_field(col::DATE_TIME),
        Field::new(col::UNIT_PRICE, DataType::Float64, true),
        Field::new(col::UNIT_QUANTITY, DataType::Float64, true),
        Field::new(col::DISCOUNT_AMOUNT, DataType::Float64, true),
        Field::new(col::GRAND_TOTAL_AMOUNT, DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(rows.iter().map(|r| Some(r.item_id.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.set_id.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.store_id.to_string())).collect()),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.gtin).collect::<Vec<_>>(),
            )),
            utf8(rows
                .iter()
                .map(|r| Some(r.scan_type.to_string()))
                .collect()),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter().map(|r| Some(r.micros)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.unit_price)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.quantity)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|_| Some(0.0)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.amount)).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("items fixture")
}

pub fn payments_batch(rows: &[PaymentRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::TRANSACTION_SET_ID, DataType::Utf8, true),
        Field::new(col::STORE_ID, DataType::Utf8, true),
        Field::new(col::PAYMENT_TYPE, DataType::Utf8, true),
        Field::new(col::CARD_TYPE, DataType::Utf8, true),
        ts_field(col::DATE_TIME),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(rows.iter().map(|r| Some(r.set_id.to_string())).collect()),
            utf8(rows.iter().map(|r| Some(r.store_id.to_string())).collect()),
            utf8(rows
                .iter()
                .map(|r| r.payment_type.map(str::to_owned))
                .collect()),
            utf8(rows.iter().map(|_| None).collect()),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter().map(|_| None::<i64>).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("payments fixture")
}

pub fn daily_agg_batch(rows: &[DailyRow]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::STORE_ID, DataType::Utf8, true),
        Field::new(col::GTIN, DataType::Int64, true),
        ts_field(col::DATE),
        Field::new(col::CALENDAR_YEAR, DataType::Int64, true),
        Field::new(col::WEEK, DataType::Int64, true),
        Field::new(col::SCAN_TYPE, DataType::Utf8, true),
        Field::new(col::CATEGORY, DataType::Utf8, true),
        Field::new(col::BRAND, DataType::Utf8, true),
        Field::new(col::SKUPOS_DESCRIPTION, DataType::Utf8, true),
        Field::new(col::QUANTITY, DataType::Float64, true),
        Field::new(col::TOTAL_REVENUE_AMOUNT, DataType::Float64, true),
        Field::new(col::TRANSACTION_COUNT, DataType::Int64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(rows.iter().map(|r| Some(r.store_id.to_string())).collect()),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| Some(r.gtin)).collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMicrosecondArray::from(
                rows.iter().map(|r| Some(r.micros)).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| Some(r.year)).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| Some(r.week)).collect::<Vec<_>>(),
            )),
            utf8(rows
                .iter()
                .map(|r| Some(r.scan_type.to_string()))
                .collect()),
            utf8(rows.iter().map(|r| r.category.map(str::to_owned)).collect()),
            utf8(rows.iter().map(|r| r.brand.map(str::to_owned)).collect()),
            utf8(rows
                .iter()
                .map(|r| r.description.map(str::to_owned))
                .collect()),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.quantity)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.revenue)).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| Some(r.transactions)).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("daily agg fixture")
}

pub fn discounts_batch(store_ids: &[&str]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(col::STORE_ID, DataType::Utf8, true),
        Field::new(col::DISCOUNT_AMOUNT, DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            utf8(store_ids.iter().map(|s| Some(s.to_string())).collect()),
            Arc::new(Float64Array::from(
                store_ids.iter().map(|_| Some(0.5)).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("discounts fixture")
}

pub fn shopper_batch(shopper_ids: &[&str]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(
        col::SHOPPER_ID,
        DataType::Utf8,
        true,
    )]));
    RecordBatch::try_new(
        schema,
        vec![utf8(shopper_ids.iter().map(|s| Some(s.to_string())).collect())],
    )
    .expect("shopper fixture")
}

/// Declarative snapshot fixture; `build` assembles an in-memory [`Snapshot`],
/// `write_data_dir` writes it out as a Parquet data directory.
#[derive(Clone, Debug, Default)]
pub struct SnapshotFixture {
    pub stores: Vec<StoreRow>,
    pub products: Vec<ProductRow>,
    pub sets: Vec<SetRow>,
    pub items: Vec<ItemRow>,
    pub payments: Vec<PaymentRow>,
    pub daily: Option<Vec<DailyRow>>,
}

impl SnapshotFixture {
    /// Two stores in allowlisted cities; no transactions yet.
    pub fn two_stores() -> Self {
        Self {
            stores: vec![
                StoreRow::default(),
                StoreRow {
                    id: "102",
                    name: "Rexburg Corner",
                    city: "Rexburg",
                    address: "42 College Ave",
                    zip: "83440",
                    lat: 43.826,
                    lon: -111.789,
                    ..StoreRow::default()
                },
            ],
            ..Self::default()
        }
    }

    pub fn build(&self) -> Snapshot {
        let store_ids: Vec<&str> = self.stores.iter().map(|s| s.id).collect();
        Snapshot {
            stores: stores_batch(&self.stores),
            products: products_batch(&self.products),
            transaction_sets: sets_batch(&self.sets),
            transaction_items: items_batch(&self.items),
            payments: payments_batch(&self.payments),
            discounts: discounts_batch(&store_ids),
            shopper: shopper_batch(&["s-1"]),
            daily_agg: self.daily.as_ref().map(|rows| daily_agg_batch(rows)),
            deduplicated_stores: 0,
            orphans: OrphanCounts::default(),
        }
    }

    /// Write the fixture as the on-disk layout the loader expects.
    pub fn write_data_dir(&self, dir: &Path) {
        let store_ids: Vec<&str> = self.stores.iter().map(|s| s.id).collect();
        write_parquet(&dir.join("cstore_stores.parquet"), &stores_batch(&self.stores));
        write_parquet(
            &dir.join("cstore_master_ctin.parquet"),
            &products_batch(&self.products),
        );
        write_parquet(
            &dir.join("cstore_transaction_sets.parquet"),
            &sets_batch(&self.sets),
        );
        let items_dir = dir.join("transaction_items");
        std::fs::create_dir_all(&items_dir).expect("items dir");
        write_parquet(&items_dir.join("part-0.parquet"), &items_batch(&self.items));
        write_parquet(
            &dir.join("cstore_payments.parquet"),
            &payments_batch(&self.payments),
        );
        write_parquet(
            &dir.join("cstore_discounts.parquet"),
            &discounts_batch(&store_ids),
        );
        write_parquet(&dir.join("cstore_shopper.parquet"), &shopper_batch(&["s-1"]));
        if let Some(rows) = &self.daily {
            write_parquet(
                &dir.join("cstore_transactions_daily_agg.parquet"),
                &daily_agg_batch(rows),
            );
        }
    }
}

/// Write one batch as a single-row-group Parquet file.
pub fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).expect("create parquet fixture");
    let schema: SchemaRef = batch.schema();
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("writer");
    writer.write(batch).expect("write batch");
    writer.close().expect("close writer");
}
