//! Typed column accessors over [`RecordBatch`].
//!
//! The loader normalizes every snapshot table to a fixed set of Arrow types
//! (Utf8 identifiers, Int64 trade item numbers, Float64 amounts, µs
//! timestamps); these helpers give the pipelines typed access and turn any
//! residual mismatch into a [`Error::Schema`] instead of a panic.

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::record_batch::RecordBatch;
use cstore_result::{Error, Result};

/// Look up a column by name.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::Schema(format!("required column '{name}' is absent")))
}

/// Look up a column that may legitimately be absent.
pub fn opt_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a ArrayRef> {
    batch.column_by_name(name)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str, expected: &str) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Schema(format!(
            "column '{name}' has type {:?}, expected {expected}",
            array.data_type()
        ))
    })
}

/// Utf8 column accessor.
pub fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    downcast(column(batch, name)?, name, "Utf8")
}

/// Int64 column accessor.
pub fn i64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    downcast(column(batch, name)?, name, "Int64")
}

/// Float64 column accessor.
pub fn f64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    downcast(column(batch, name)?, name, "Float64")
}

/// Timestamp(µs) column accessor.
pub fn ts_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a TimestampMicrosecondArray> {
    downcast(column(batch, name)?, name, "Timestamp(Microsecond)")
}

/// Null-aware value reads. `None` is a null cell, not a missing column.
pub fn str_at<'a>(array: &'a StringArray, row: usize) -> Option<&'a str> {
    array.is_valid(row).then(|| array.value(row))
}

pub fn i64_at(array: &Int64Array, row: usize) -> Option<i64> {
    array.is_valid(row).then(|| array.value(row))
}

pub fn f64_at(array: &Float64Array, row: usize) -> Option<f64> {
    array.is_valid(row).then(|| array.value(row))
}

pub fn ts_at(array: &TimestampMicrosecondArray, row: usize) -> Option<i64> {
    array.is_valid(row).then(|| array.value(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("amount", DataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("a"), None])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let batch = sample();
        assert!(matches!(str_col(&batch, "nope"), Err(Error::Schema(_))));
    }

    #[test]
    fn type_mismatch_is_a_schema_error() {
        let batch = sample();
        assert!(matches!(i64_col(&batch, "amount"), Err(Error::Schema(_))));
    }

    #[test]
    fn null_cells_read_as_none() {
        let batch = sample();
        let ids = str_col(&batch, "id").unwrap();
        assert_eq!(str_at(ids, 0), Some("a"));
        assert_eq!(str_at(ids, 1), None);
    }
}
