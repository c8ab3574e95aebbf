//! The loader: Parquet files in, a filtered [`Snapshot`] out.

use std::path::{Path, PathBuf};

use arrow::array::{Array, BooleanArray};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::record_batch::RecordBatch;
use cstore_model::batch::{str_at, str_col};
use cstore_model::schema::{col, TableKind};
use cstore_result::{Error, Result};
use rustc_hash::FxHashSet;

use crate::dedup::deduplicate_stores;
use crate::normalize::{align_to_schema, normalize_table};
use crate::reader::{read_parquet_dir, read_parquet_file};
use crate::snapshot::{OrphanCounts, Snapshot};

/// Default city allowlist: the three towns the dashboard covers.
pub const DEFAULT_CITIES: &[&str] = &["rigby", "ririe", "rexburg"];

/// Where to load from and which stores to keep.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    /// Case-insensitive city names; empty keeps every store.
    pub store_allowlist: Vec<String>,
}

impl LoadOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            store_allowlist: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_allowlist(mut self, cities: Vec<String>) -> Self {
        self.store_allowlist = cities;
        self
    }
}

/// Reads the snapshot tables, filtering store-scoped tables to the allowlist
/// during load so out-of-scope rows never reach memory-resident tables.
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load and validate the shape of every table, producing a [`Snapshot`].
    pub fn load(&self) -> Result<Snapshot> {
        let all_stores = self.load_stores_unfiltered()?;
        let full_ids = store_id_set(&all_stores)?;

        let dedup_outcome = deduplicate_stores(&all_stores)?;
        let deduplicated_stores = dedup_outcome.dropped;
        let stores = self.filter_by_city(&dedup_outcome.batch)?;
        if stores.num_rows() == 0 {
            return Err(Error::InvalidArgumentError(format!(
                "store allowlist {:?} matched no stores",
                self.options.store_allowlist
            )));
        }
        let allowed_ids = store_id_set(&stores)?;
        tracing::debug!(
            stores = stores.num_rows(),
            deduplicated = deduplicated_stores,
            "stores loaded"
        );

        let products = self.load_required(TableKind::Products)?;

        let mut orphans = OrphanCounts::default();

        let sets = self.load_required(TableKind::TransactionSets)?;
        let (transaction_sets, set_orphans) = filter_by_store(&sets, &allowed_ids, &full_ids)?;
        orphans.transaction_sets = set_orphans;
        let kept_set_ids = id_set(&transaction_sets, col::TRANSACTION_SET_ID)?;

        let items = self.load_required(TableKind::TransactionItems)?;
        let (items, item_store_orphans) = filter_by_store(&items, &allowed_ids, &full_ids)?;
        orphans.transaction_items_store = item_store_orphans;
        let (transaction_items, item_set_orphans) =
            filter_by_membership(&items, col::TRANSACTION_SET_ID, &kept_set_ids)?;
        orphans.transaction_items_set = item_set_orphans;

        let payments = self.load_required(TableKind::Payments)?;
        let (payments, payment_orphans) = filter_by_store(&payments, &allowed_ids, &full_ids)?;
        orphans.payments = payment_orphans;

        let discounts = self.load_required(TableKind::Discounts)?;
        let (discounts, discount_orphans) = filter_by_store(&discounts, &allowed_ids, &full_ids)?;
        orphans.discounts = discount_orphans;

        let daily_agg = match self.load_optional(TableKind::DailyAggregate)? {
            Some(agg) => {
                let (agg, agg_orphans) = filter_by_store(&agg, &allowed_ids, &full_ids)?;
                orphans.daily_agg = agg_orphans;
                Some(agg)
            }
            None => None,
        };

        let shopper = self.load_required(TableKind::Shopper)?;

        tracing::info!(
            stores = stores.num_rows(),
            products = products.num_rows(),
            transaction_sets = transaction_sets.num_rows(),
            transaction_items = transaction_items.num_rows(),
            orphans = orphans.total(),
            "snapshot loaded"
        );

        Ok(Snapshot {
            stores,
            products,
            transaction_sets,
            transaction_items,
            payments,
            discounts,
            shopper,
            daily_agg,
            deduplicated_stores,
            orphans,
        })
    }

    /// Union of the stores table and the optional status overlay, normalized
    /// but not yet deduplicated or city-filtered. Public so callers can
    /// enumerate the cities available in a data directory.
    pub fn load_stores_unfiltered(&self) -> Result<RecordBatch> {
        let stores = self.load_required(TableKind::Stores)?;
        match self.load_optional(TableKind::StoreStatus)? {
            Some(status) => {
                let aligned = align_to_schema(&status, &stores.schema())?;
                Ok(concat_batches(&stores.schema(), &[stores, aligned])?)
            }
            None => Ok(stores),
        }
    }

    fn table_path(&self, kind: TableKind) -> PathBuf {
        self.options.data_dir.join(kind.source_path())
    }

    fn read_normalized(&self, kind: TableKind, path: &Path) -> Result<RecordBatch> {
        let (schema, batches) = if kind == TableKind::TransactionItems {
            read_parquet_dir(path)?
        } else {
            read_parquet_file(path)?
        };
        normalize_table(kind, schema, &batches)
    }

    fn load_required(&self, kind: TableKind) -> Result<RecordBatch> {
        let path = self.table_path(kind);
        self.read_normalized(kind, &path)
    }

    fn load_optional(&self, kind: TableKind) -> Result<Option<RecordBatch>> {
        let path = self.table_path(kind);
        if !path.exists() {
            tracing::debug!(table = kind.name(), "optional table absent");
            return Ok(None);
        }
        self.read_normalized(kind, &path).map(Some)
    }

    fn filter_by_city(&self, stores: &RecordBatch) -> Result<RecordBatch> {
        if self.options.store_allowlist.is_empty() {
            return Ok(stores.clone());
        }
        let allow: FxHashSet<String> = self
            .options
            .store_allowlist
            .iter()
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        let cities = str_col(stores, col::CITY)?;
        let mask: BooleanArray = (0..stores.num_rows())
            .map(|row| {
                Some(
                    str_at(cities, row)
                        .is_some_and(|city| allow.contains(&city.trim().to_ascii_lowercase())),
                )
            })
            .collect();
        Ok(filter_record_batch(stores, &mask)?)
    }
}

fn store_id_set(batch: &RecordBatch) -> Result<FxHashSet<String>> {
    id_set(batch, col::STORE_ID)
}

fn id_set(batch: &RecordBatch, column: &str) -> Result<FxHashSet<String>> {
    let ids = str_col(batch, column)?;
    Ok((0..ids.len())
        .filter_map(|row| str_at(ids, row).map(str::to_owned))
        .collect())
}

/// Keep rows whose store id is in the allowlisted set. Rows pointing at no
/// known store at all are orphans: excluded and counted, never silently lost
/// among the out-of-scope rows.
fn filter_by_store(
    batch: &RecordBatch,
    allowed: &FxHashSet<String>,
    full: &FxHashSet<String>,
) -> Result<(RecordBatch, usize)> {
    let ids = str_col(batch, col::STORE_ID)?;
    let mut orphans = 0usize;
    let mask: BooleanArray = (0..batch.num_rows())
        .map(|row| match str_at(ids, row) {
            Some(id) if allowed.contains(id) => Some(true),
            Some(id) if full.contains(id) => Some(false),
            _ => {
                orphans += 1;
                Some(false)
            }
        })
        .collect();
    Ok((filter_record_batch(batch, &mask)?, orphans))
}

/// Keep rows whose `column` value is in `keep`; count the rest.
fn filter_by_membership(
    batch: &RecordBatch,
    column: &str,
    keep: &FxHashSet<String>,
) -> Result<(RecordBatch, usize)> {
    let ids = str_col(batch, column)?;
    let mut dropped = 0usize;
    let mask: BooleanArray = (0..batch.num_rows())
        .map(|row| {
            let keep_row = str_at(ids, row).is_some_and(|id| keep.contains(id));
            if !keep_row {
                dropped += 1;
            }
            Some(keep_row)
        })
        .collect();
    Ok((filter_record_batch(batch, &mask)?, dropped))
}
