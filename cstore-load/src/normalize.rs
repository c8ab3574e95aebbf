//! Column-type normalization applied to every table at load time.
//!
//! Source snapshots are inconsistent about identifier and timestamp types
//! (numeric vs string store ids, string vs native timestamps, Date32 daily
//! keys). Downstream code assumes one normalized shape per column name:
//! Utf8 identifiers, Int64 trade item numbers and calendar keys, Float64
//! amounts, Timestamp(µs) date-times. Casting happens once here so the
//! pipelines never re-check types.

use std::sync::Arc;

use arrow::array::new_null_array;
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use cstore_model::schema::{col, TableKind};
use cstore_result::{Error, Result};

/// The normalized type for a known column name, or `None` to leave the
/// column as the source wrote it.
fn target_type(name: &str) -> Option<DataType> {
    match name {
        col::STORE_ID
        | col::TRANSACTION_SET_ID
        | col::TRANSACTION_ITEM_ID
        | col::SHOPPER_ID
        | col::CHAIN_ID
        | col::STORE_NAME
        | col::CITY
        | col::STATE
        | col::STREET_ADDRESS
        | col::ZIP_CODE
        | col::SKUPOS_DESCRIPTION
        | col::CATEGORY
        | col::SUBCATEGORY
        | col::BRAND
        | col::MANUFACTURER
        | col::UNIT_SIZE
        | col::SCAN_TYPE
        | col::PAYMENT_TYPE
        | col::CARD_TYPE => Some(DataType::Utf8),
        col::GTIN | col::CALENDAR_YEAR | col::WEEK | col::TRANSACTION_COUNT | col::POS_TYPE_ID => {
            Some(DataType::Int64)
        }
        col::LATITUDE
        | col::LONGITUDE
        | col::SUBTOTAL_AMOUNT
        | col::TAX_AMOUNT
        | col::GRAND_TOTAL_AMOUNT
        | col::UNIT_PRICE
        | col::UNIT_QUANTITY
        | col::DISCOUNT_AMOUNT
        | col::QUANTITY
        | col::TOTAL_REVENUE_AMOUNT => Some(DataType::Float64),
        col::DATE_TIME | col::DATE | col::CREATED_AT | col::UPDATED_AT => {
            Some(DataType::Timestamp(TimeUnit::Microsecond, None))
        }
        _ => None,
    }
}

/// The schema a table takes after normalization. Every normalized column is
/// nullable: a cell the cast cannot represent becomes null and is left for
/// the validator to count.
pub fn normalized_schema(source: &SchemaRef) -> SchemaRef {
    let fields: Vec<Field> = source
        .fields()
        .iter()
        .map(|f| match target_type(f.name()) {
            Some(dt) => Field::new(f.name(), dt, true),
            None => f.as_ref().clone(),
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Check that every required column of `kind` exists in `schema`.
pub fn check_required_columns(kind: TableKind, schema: &SchemaRef) -> Result<()> {
    for required in kind.required_columns() {
        if schema.field_with_name(required).is_err() {
            return Err(Error::Schema(format!(
                "table '{}': required column '{required}' is absent",
                kind.name()
            )));
        }
    }
    Ok(())
}

fn cast_batch(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(target.fields().len());
    for (idx, field) in target.fields().iter().enumerate() {
        let source = batch.column(idx);
        if source.data_type() == field.data_type() {
            columns.push(source.clone());
        } else {
            let casted = cast(source, field.data_type()).map_err(|e| {
                Error::Schema(format!(
                    "column '{}' cannot be normalized from {:?}: {e}",
                    field.name(),
                    source.data_type()
                ))
            })?;
            columns.push(casted);
        }
    }
    Ok(RecordBatch::try_new(target.clone(), columns)?)
}

/// Normalize a table: verify required columns, cast every batch to the
/// normalized schema, and concatenate into one contiguous RecordBatch.
pub fn normalize_table(
    kind: TableKind,
    schema: SchemaRef,
    batches: &[RecordBatch],
) -> Result<RecordBatch> {
    check_required_columns(kind, &schema)?;
    let target = normalized_schema(&schema);

    let mut normalized = Vec::with_capacity(batches.len());
    for batch in batches {
        normalized.push(cast_batch(batch, &target)?);
    }
    Ok(concat_batches(&target, &normalized)?)
}

/// Project a batch onto a target schema by column name.
///
/// Columns absent from the source materialize as all-null arrays; present
/// columns are cast to the target field type. Used to union the optional
/// store-status overlay into the stores table before deduplication.
pub fn align_to_schema(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let mut columns = Vec::with_capacity(target.fields().len());
    for field in target.fields() {
        match batch.column_by_name(field.name()) {
            Some(source) if source.data_type() == field.data_type() => {
                columns.push(source.clone());
            }
            Some(source) => {
                let casted = cast(source, field.data_type()).map_err(|e| {
                    Error::Schema(format!(
                        "column '{}' cannot be aligned from {:?}: {e}",
                        field.name(),
                        source.data_type()
                    ))
                })?;
                columns.push(casted);
            }
            None => columns.push(new_null_array(field.data_type(), rows)),
        }
    }
    Ok(RecordBatch::try_new(target.clone(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray, TimestampMicrosecondArray};

    fn stores_like(store_ids: Vec<i64>) -> (SchemaRef, RecordBatch) {
        let schema = Arc::new(Schema::new(vec![
            Field::new(col::STORE_ID, DataType::Int64, false),
            Field::new(col::STORE_NAME, DataType::Utf8, true),
            Field::new(col::CITY, DataType::Utf8, true),
            Field::new(col::STREET_ADDRESS, DataType::Utf8, true),
            Field::new(col::UPDATED_AT, DataType::Utf8, true),
        ]));
        let n = store_ids.len();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(store_ids)),
                Arc::new(StringArray::from(vec![Some("Store"); n])),
                Arc::new(StringArray::from(vec![Some("Rigby"); n])),
                Arc::new(StringArray::from(vec![Some("1 Main St"); n])),
                Arc::new(StringArray::from(vec![Some("2024-01-01T00:00:00"); n])),
            ],
        )
        .unwrap();
        (schema, batch)
    }

    #[test]
    fn numeric_store_ids_become_strings() {
        let (schema, batch) = stores_like(vec![101, 102]);
        let normalized = normalize_table(TableKind::Stores, schema, &[batch]).unwrap();
        let ids = normalized
            .column_by_name(col::STORE_ID)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "101");
    }

    #[test]
    fn string_timestamps_parse_to_micros() {
        let (schema, batch) = stores_like(vec![101]);
        let normalized = normalize_table(TableKind::Stores, schema, &[batch]).unwrap();
        let updated = normalized
            .column_by_name(col::UPDATED_AT)
            .unwrap()
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        // 2024-01-01T00:00:00 UTC
        assert_eq!(updated.value(0), 1_704_067_200_000_000);
    }

    #[test]
    fn absent_required_column_is_a_schema_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            col::STORE_ID,
            DataType::Int64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(vec![1]))],
        )
        .unwrap();
        let err = normalize_table(TableKind::Stores, schema, &[batch]).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn align_fills_missing_columns_with_nulls() {
        let (schema, batch) = stores_like(vec![101]);
        let target = normalized_schema(&schema);
        let partial_schema = Arc::new(Schema::new(vec![Field::new(
            col::STORE_ID,
            DataType::Int64,
            false,
        )]));
        let partial = RecordBatch::try_new(
            partial_schema,
            vec![Arc::new(Int64Array::from(vec![7]))],
        )
        .unwrap();

        let aligned = align_to_schema(&partial, &target).unwrap();
        assert_eq!(aligned.num_columns(), batch.num_columns());
        assert!(aligned
            .column_by_name(col::STORE_NAME)
            .unwrap()
            .is_null(0));
    }
}
