//! Store deduplication.
//!
//! A store can appear more than once in the unioned stores/status rows: one
//! row per ownership change, plus occasional re-registrations at the same
//! street address under a fresh identifier. Both passes keep the most recent
//! record, ordered by `coalesce(UPDATED_AT, CREATED_AT)`; on equal timestamps
//! the earliest row wins, which keeps repeated loads deterministic.

use arrow::array::{Array, ArrayRef, TimestampMicrosecondArray, UInt64Array};
use arrow::compute::take;
use arrow::record_batch::RecordBatch;
use cstore_model::batch::{opt_column, str_at, str_col, ts_at};
use cstore_result::Result;
use rustc_hash::FxHashMap;

use cstore_model::schema::col;

/// Result of a deduplication pass: the surviving rows plus how many were
/// discarded.
pub struct DedupOutcome {
    pub batch: RecordBatch,
    pub dropped: usize,
}

fn ts_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Option<&'a TimestampMicrosecondArray> {
    opt_column(batch, name)?
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
}

fn take_rows(batch: &RecordBatch, rows: &[usize]) -> Result<RecordBatch> {
    let indices = UInt64Array::from(rows.iter().map(|&r| r as u64).collect::<Vec<_>>());
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|c| take(c, &indices, None))
        .collect::<std::result::Result<_, _>>()?;
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

/// Keep, per key, the row with the greatest sort timestamp. Rows with a null
/// key cannot be deduplicated and always survive.
fn keep_latest_per_key<F>(rows: usize, key_of: F, sort_key: &[i64]) -> Vec<usize>
where
    F: Fn(usize) -> Option<String>,
{
    let mut latest: FxHashMap<String, (usize, i64)> = FxHashMap::default();
    let mut keyless = Vec::new();

    for row in 0..rows {
        match key_of(row) {
            None => keyless.push(row),
            Some(key) => match latest.get(&key) {
                Some(&(_, existing)) if existing >= sort_key[row] => {}
                _ => {
                    latest.insert(key, (row, sort_key[row]));
                }
            },
        }
    }

    let mut keep: Vec<usize> = latest.values().map(|&(row, _)| row).collect();
    keep.extend(keyless);
    keep.sort_unstable();
    keep
}

/// Deduplicate the stores table by identifier, then by normalized street
/// address.
pub fn deduplicate_stores(batch: &RecordBatch) -> Result<DedupOutcome> {
    let total = batch.num_rows();
    let store_ids = str_col(batch, col::STORE_ID)?;
    let updated = ts_column(batch, col::UPDATED_AT);
    let created = ts_column(batch, col::CREATED_AT);

    let sort_key: Vec<i64> = (0..total)
        .map(|row| {
            updated
                .and_then(|a| ts_at(a, row))
                .or_else(|| created.and_then(|a| ts_at(a, row)))
                .unwrap_or(i64::MIN)
        })
        .collect();

    let by_id = keep_latest_per_key(
        total,
        |row| str_at(store_ids, row).map(str::to_owned),
        &sort_key,
    );
    let deduped = take_rows(batch, &by_id)?;

    // Second pass over the survivors: collapse re-registrations at the same
    // normalized street address.
    let addresses = str_col(&deduped, col::STREET_ADDRESS)?;
    let survivor_keys: Vec<i64> = by_id.iter().map(|&row| sort_key[row]).collect();
    let by_address = keep_latest_per_key(
        deduped.num_rows(),
        |row| {
            str_at(addresses, row).and_then(|a| {
                let normalized = a.trim().to_ascii_lowercase();
                (!normalized.is_empty()).then_some(normalized)
            })
        },
        &survivor_keys,
    );
    let final_batch = take_rows(&deduped, &by_address)?;

    let dropped = total - final_batch.num_rows();
    Ok(DedupOutcome {
        batch: final_batch,
        dropped,
    })
}
