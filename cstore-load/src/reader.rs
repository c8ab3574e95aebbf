//! Parquet file reading utilities.

use std::fs::File;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use cstore_result::{Error, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Read all RecordBatches from a single Parquet file.
///
/// Returns the file's Arrow schema alongside the batches so callers can build
/// an empty table when the file holds no row groups.
pub fn read_parquet_file(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let file = File::open(path)
        .map_err(|e| Error::DataSource(format!("cannot open {}: {e}", path.display())))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::DataSource(format!("cannot read {}: {e}", path.display())))?;
    let schema = builder.schema().clone();

    let reader = builder
        .build()
        .map_err(|e| Error::DataSource(format!("cannot read {}: {e}", path.display())))?;

    let mut batches = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| {
            Error::DataSource(format!("failed to decode {}: {e}", path.display()))
        })?;
        batches.push(batch);
    }

    Ok((schema, batches))
}

/// Read every `*.parquet` part under a directory, in file-name order.
///
/// The transaction-items table is partitioned this way; file-name order keeps
/// repeated loads deterministic.
pub fn read_parquet_dir(dir: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::DataSource(format!("cannot open {}: {e}", dir.display())))?;

    let mut parts: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "parquet"))
        .collect();
    parts.sort();

    if parts.is_empty() {
        return Err(Error::DataSource(format!(
            "no parquet parts under {}",
            dir.display()
        )));
    }

    let mut schema = None;
    let mut batches = Vec::new();
    for part in &parts {
        let (part_schema, part_batches) = read_parquet_file(part)?;
        schema.get_or_insert(part_schema);
        batches.extend(part_batches);
    }

    // parts is non-empty, so the schema was set by the first file
    let schema =
        schema.ok_or_else(|| Error::Internal("partitioned read produced no schema".into()))?;
    Ok((schema, batches))
}
