//! Transient hash indexes built per pipeline invocation.
//!
//! The product master and the payments table are the small sides of every
//! join in this core; each pipeline builds the index it needs, probes the
//! large item/set tables row by row, and drops the index on return.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use cstore_model::batch::{i64_at, i64_col, opt_column, str_at, str_col};
use cstore_model::schema::col;
use cstore_model::PaymentClass;
use cstore_result::Result;
use rustc_hash::FxHashMap;

/// Product-master attributes keyed by GTIN.
#[derive(Clone, Debug, Default)]
pub struct ProductInfo {
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
}

pub struct ProductIndex {
    by_gtin: FxHashMap<i64, ProductInfo>,
}

impl ProductIndex {
    pub fn build(products: &RecordBatch) -> Result<ProductIndex> {
        let gtins = i64_col(products, col::GTIN)?;
        let descriptions = str_col(products, col::SKUPOS_DESCRIPTION)?;
        let categories = opt_str(products, col::CATEGORY)?;
        let subcategories = opt_str(products, col::SUBCATEGORY)?;
        let brands = opt_str(products, col::BRAND)?;
        let manufacturers = opt_str(products, col::MANUFACTURER)?;

        let mut by_gtin = FxHashMap::default();
        for row in 0..products.num_rows() {
            let Some(gtin) = i64_at(gtins, row) else {
                continue;
            };
            by_gtin.insert(
                gtin,
                ProductInfo {
                    description: str_at(descriptions, row).map(str::to_owned),
                    category: categories.value_at(row),
                    subcategory: subcategories.value_at(row),
                    brand: brands.value_at(row),
                    manufacturer: manufacturers.value_at(row),
                },
            );
        }
        Ok(ProductIndex { by_gtin })
    }

    pub fn get(&self, gtin: i64) -> Option<&ProductInfo> {
        self.by_gtin.get(&gtin)
    }

    pub fn len(&self) -> usize {
        self.by_gtin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gtin.is_empty()
    }
}

/// Payment classification per transaction set.
///
/// A set with no payment row classifies as [`PaymentClass::Unknown`]. When a
/// basket carries several payment rows (split tender), the first classifiable
/// row wins; a later row never downgrades a known class back to `Unknown`.
pub struct PaymentClassIndex {
    by_set: FxHashMap<String, PaymentClass>,
}

impl PaymentClassIndex {
    pub fn build(payments: &RecordBatch) -> Result<PaymentClassIndex> {
        let set_ids = str_col(payments, col::TRANSACTION_SET_ID)?;
        let types = str_col(payments, col::PAYMENT_TYPE)?;

        let mut by_set: FxHashMap<String, PaymentClass> = FxHashMap::default();
        for row in 0..payments.num_rows() {
            let Some(set_id) = str_at(set_ids, row) else {
                continue;
            };
            let class = PaymentClass::classify(str_at(types, row));
            match by_set.get(set_id) {
                Some(PaymentClass::Unknown) | None => {
                    by_set.insert(set_id.to_owned(), class);
                }
                Some(_) => {}
            }
        }
        Ok(PaymentClassIndex { by_set })
    }

    /// Class for a set id; absence of any payment row is `Unknown`.
    pub fn classify(&self, set_id: &str) -> PaymentClass {
        self.by_set
            .get(set_id)
            .copied()
            .unwrap_or(PaymentClass::Unknown)
    }
}

/// Optional Utf8 column wrapper: a missing column reads as all-null rather
/// than failing, because daily-aggregate product columns are not guaranteed.
pub struct OptStrColumn<'a> {
    array: Option<&'a arrow::array::StringArray>,
}

impl<'a> OptStrColumn<'a> {
    pub fn str_at(&self, row: usize) -> Option<&'a str> {
        self.array.and_then(|a| str_at(a, row))
    }

    pub fn value_at(&self, row: usize) -> Option<String> {
        self.str_at(row).map(str::to_owned)
    }
}

pub fn opt_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<OptStrColumn<'a>> {
    match opt_column(batch, name) {
        None => Ok(OptStrColumn { array: None }),
        Some(array) => {
            let array = array
                .as_any()
                .downcast_ref::<arrow::array::StringArray>()
                .ok_or_else(|| {
                    cstore_result::Error::Schema(format!(
                        "column '{name}' has type {:?}, expected Utf8",
                        array.data_type()
                    ))
                })?;
            Ok(OptStrColumn { array: Some(array) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstore_test_utils::{payments_batch, products_batch, PaymentRow, ProductRow};

    #[test]
    fn product_index_keys_by_gtin() {
        let batch = products_batch(&[
            ProductRow::new(100, "Cola 12oz", "Packaged Beverages"),
            ProductRow::new(200, "Unleaded", "Fuel"),
        ]);
        let index = ProductIndex::build(&batch).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get(200).and_then(|p| p.category.as_deref()),
            Some("Fuel")
        );
        assert!(index.get(300).is_none());
    }

    #[test]
    fn split_tender_keeps_the_first_classifiable_row() {
        let batch = payments_batch(&[
            PaymentRow {
                set_id: "t-1",
                store_id: "101",
                payment_type: None,
            },
            PaymentRow {
                set_id: "t-1",
                store_id: "101",
                payment_type: Some("debit"),
            },
        ]);
        let index = PaymentClassIndex::build(&batch).unwrap();
        assert_eq!(index.classify("t-1"), PaymentClass::Credit);
        assert_eq!(index.classify("t-404"), PaymentClass::Unknown);
    }
}
