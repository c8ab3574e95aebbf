//! The data dictionary: table kinds, source file names, column names, and the
//! required-column lists the loader and validator enforce.

/// Column names shared across tables.
pub mod col {
    pub const STORE_ID: &str = "STORE_ID";
    pub const STORE_NAME: &str = "STORE_NAME";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const CITY: &str = "CITY";
    pub const STATE: &str = "STATE";
    pub const STREET_ADDRESS: &str = "STREET_ADDRESS";
    pub const ZIP_CODE: &str = "ZIP_CODE";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const CREATED_AT: &str = "CREATED_AT";
    pub const UPDATED_AT: &str = "UPDATED_AT";

    pub const GTIN: &str = "GTIN";
    pub const SKUPOS_DESCRIPTION: &str = "SKUPOS_DESCRIPTION";
    pub const CATEGORY: &str = "CATEGORY";
    pub const SUBCATEGORY: &str = "SUBCATEGORY";
    pub const BRAND: &str = "BRAND";
    pub const MANUFACTURER: &str = "MANUFACTURER";
    pub const UNIT_SIZE: &str = "UNIT_SIZE";

    pub const TRANSACTION_SET_ID: &str = "TRANSACTION_SET_ID";
    pub const TRANSACTION_ITEM_ID: &str = "TRANSACTION_ITEM_ID";
    pub const DATE_TIME: &str = "DATE_TIME";
    pub const POS_TYPE_ID: &str = "POS_TYPE_ID";
    pub const SUBTOTAL_AMOUNT: &str = "SUBTOTAL_AMOUNT";
    pub const TAX_AMOUNT: &str = "TAX_AMOUNT";
    pub const GRAND_TOTAL_AMOUNT: &str = "GRAND_TOTAL_AMOUNT";

    pub const SCAN_TYPE: &str = "SCAN_TYPE";
    pub const UNIT_PRICE: &str = "UNIT_PRICE";
    pub const UNIT_QUANTITY: &str = "UNIT_QUANTITY";
    pub const DISCOUNT_AMOUNT: &str = "DISCOUNT_AMOUNT";

    pub const PAYMENT_TYPE: &str = "PAYMENT_TYPE";
    pub const CARD_TYPE: &str = "CARD_TYPE";

    pub const DATE: &str = "DATE";
    pub const CALENDAR_YEAR: &str = "CALENDAR_YEAR";
    /// The source snapshot spells this column with a lowercase trailing `k`.
    pub const WEEK: &str = "WEEk";
    pub const QUANTITY: &str = "QUANTITY";
    pub const TOTAL_REVENUE_AMOUNT: &str = "TOTAL_REVENUE_AMOUNT";
    pub const TRANSACTION_COUNT: &str = "TRANSACTION_COUNT";

    pub const SHOPPER_ID: &str = "SHOPPER_ID";
}

/// One entity table of the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Stores,
    /// Store status rows union into `Stores` before deduplication.
    StoreStatus,
    Products,
    TransactionSets,
    TransactionItems,
    DailyAggregate,
    Payments,
    Discounts,
    Shopper,
}

impl TableKind {
    /// Stable table name used in reports and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Stores => "stores",
            TableKind::StoreStatus => "store_status",
            TableKind::Products => "products",
            TableKind::TransactionSets => "transaction_sets",
            TableKind::TransactionItems => "transaction_items",
            TableKind::DailyAggregate => "daily_agg",
            TableKind::Payments => "payments",
            TableKind::Discounts => "discounts",
            TableKind::Shopper => "shopper",
        }
    }

    /// Location of this table under the data directory. Transaction items are
    /// a directory of Parquet parts; everything else is a single file.
    pub fn source_path(&self) -> &'static str {
        match self {
            TableKind::Stores => "cstore_stores.parquet",
            TableKind::StoreStatus => "cstore_store_status.parquet",
            TableKind::Products => "cstore_master_ctin.parquet",
            TableKind::TransactionSets => "cstore_transaction_sets.parquet",
            TableKind::TransactionItems => "transaction_items",
            TableKind::DailyAggregate => "cstore_transactions_daily_agg.parquet",
            TableKind::Payments => "cstore_payments.parquet",
            TableKind::Discounts => "cstore_discounts.parquet",
            TableKind::Shopper => "cstore_shopper.parquet",
        }
    }

    /// Whether the snapshot is loadable without this table.
    ///
    /// The daily aggregate is an optional fast path and the status table is an
    /// optional overlay on `stores`; every other table is required.
    pub fn optional(&self) -> bool {
        matches!(self, TableKind::DailyAggregate | TableKind::StoreStatus)
    }

    /// Columns that must exist for the table to be structurally valid.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Stores | TableKind::StoreStatus => &[
                col::STORE_ID,
                col::STORE_NAME,
                col::CITY,
                col::STREET_ADDRESS,
            ],
            TableKind::Products => &[col::GTIN, col::SKUPOS_DESCRIPTION],
            TableKind::TransactionSets => &[
                col::TRANSACTION_SET_ID,
                col::STORE_ID,
                col::DATE_TIME,
                col::GRAND_TOTAL_AMOUNT,
            ],
            TableKind::TransactionItems => &[
                col::TRANSACTION_ITEM_ID,
                col::TRANSACTION_SET_ID,
                col::STORE_ID,
                col::SCAN_TYPE,
                col::DATE_TIME,
                col::UNIT_QUANTITY,
                col::GRAND_TOTAL_AMOUNT,
            ],
            TableKind::DailyAggregate => &[
                col::STORE_ID,
                col::GTIN,
                col::DATE,
                col::CALENDAR_YEAR,
                col::WEEK,
                col::QUANTITY,
                col::TOTAL_REVENUE_AMOUNT,
                col::TRANSACTION_COUNT,
            ],
            TableKind::Payments => &[col::TRANSACTION_SET_ID, col::STORE_ID, col::PAYMENT_TYPE],
            TableKind::Discounts => &[col::STORE_ID],
            TableKind::Shopper => &[col::SHOPPER_ID],
        }
    }

    /// Does this table carry a store identifier the allowlist filter applies to?
    pub fn store_scoped(&self) -> bool {
        !matches!(self, TableKind::Products | TableKind::Shopper)
    }
}

/// Tables of the snapshot in load order.
pub const SNAPSHOT_TABLES: &[TableKind] = &[
    TableKind::Stores,
    TableKind::StoreStatus,
    TableKind::Products,
    TableKind::TransactionSets,
    TableKind::TransactionItems,
    TableKind::DailyAggregate,
    TableKind::Payments,
    TableKind::Discounts,
    TableKind::Shopper,
];
