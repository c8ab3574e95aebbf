//! The loaded snapshot: one normalized RecordBatch per entity table.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use cstore_model::batch::{str_at, str_col};
use cstore_model::schema::{col, TableKind};
use cstore_result::Result;
use rustc_hash::FxHashSet;

/// Rows excluded at load time because a foreign key had no parent row.
///
/// Orphans are excluded from the snapshot but never silently: the counts are
/// carried here and surfaced through the validator's report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrphanCounts {
    /// Transaction sets whose store id matched no store record.
    pub transaction_sets: usize,
    /// Transaction items whose store id matched no store record.
    pub transaction_items_store: usize,
    /// Transaction items whose basket was itself excluded or absent.
    pub transaction_items_set: usize,
    /// Payments whose store id matched no store record.
    pub payments: usize,
    /// Daily-aggregate rows whose store id matched no store record.
    pub daily_agg: usize,
    /// Discount rows whose store id matched no store record.
    pub discounts: usize,
}

impl OrphanCounts {
    pub fn total(&self) -> usize {
        self.transaction_sets
            + self.transaction_items_store
            + self.transaction_items_set
            + self.payments
            + self.daily_agg
            + self.discounts
    }
}

/// An immutable, validated-shape view of one load of the source files.
///
/// All tables are normalized (see [`crate::normalize`]) and filtered to the
/// configured store allowlist. Snapshots are shared behind `Arc` by the cache
/// layer; pipelines only ever read from them.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub stores: RecordBatch,
    pub products: RecordBatch,
    pub transaction_sets: RecordBatch,
    pub transaction_items: RecordBatch,
    pub payments: RecordBatch,
    pub discounts: RecordBatch,
    pub shopper: RecordBatch,
    /// Pre-rolled per-store/product/day metrics; an optional fast path.
    pub daily_agg: Option<RecordBatch>,
    /// Store rows discarded by deduplication.
    pub deduplicated_stores: usize,
    pub orphans: OrphanCounts,
}

impl Snapshot {
    /// Identifiers of the stores in this snapshot, in table order.
    pub fn store_ids(&self) -> Result<Vec<String>> {
        let ids = str_col(&self.stores, col::STORE_ID)?;
        Ok((0..ids.len())
            .filter_map(|row| str_at(ids, row).map(str::to_owned))
            .collect())
    }

    /// Same identifiers as a lookup set.
    pub fn store_id_set(&self) -> Result<FxHashSet<String>> {
        Ok(self.store_ids()?.into_iter().collect())
    }

    /// Access a table by kind; `None` for an optional table that was absent.
    pub fn table(&self, kind: TableKind) -> Option<&RecordBatch> {
        match kind {
            TableKind::Stores => Some(&self.stores),
            // The status overlay is unioned into `stores` before dedup and
            // does not survive as its own table.
            TableKind::StoreStatus => None,
            TableKind::Products => Some(&self.products),
            TableKind::TransactionSets => Some(&self.transaction_sets),
            TableKind::TransactionItems => Some(&self.transaction_items),
            TableKind::DailyAggregate => self.daily_agg.as_ref(),
            TableKind::Payments => Some(&self.payments),
            TableKind::Discounts => Some(&self.discounts),
            TableKind::Shopper => Some(&self.shopper),
        }
    }
}
