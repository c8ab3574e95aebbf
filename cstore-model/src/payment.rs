//! Payment classification for the cash-vs-credit comparison.

use serde::Serialize;
use std::fmt;

/// The class a basket's tender falls into.
///
/// `Unknown` is a first-class bucket for transaction sets with no payment row
/// or a null payment type; it is reported separately, never folded into
/// `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PaymentClass {
    Cash,
    Credit,
    Other,
    Unknown,
}

impl PaymentClass {
    pub const ALL: [PaymentClass; 4] = [
        PaymentClass::Cash,
        PaymentClass::Credit,
        PaymentClass::Other,
        PaymentClass::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentClass::Cash => "Cash",
            PaymentClass::Credit => "Credit",
            PaymentClass::Other => "Other",
            PaymentClass::Unknown => "Unknown",
        }
    }

    /// Classify a raw payment-type value from the payments table.
    ///
    /// Matching is case-insensitive. Card-present tenders (credit, debit,
    /// generic "card") all classify as `Credit`; a missing or blank value is
    /// `Unknown`.
    pub fn classify(payment_type: Option<&str>) -> PaymentClass {
        let Some(raw) = payment_type else {
            return PaymentClass::Unknown;
        };
        let value = raw.trim();
        if value.is_empty() {
            return PaymentClass::Unknown;
        }
        let lower = value.to_ascii_lowercase();
        match lower.as_str() {
            "cash" => PaymentClass::Cash,
            "credit" | "debit" | "card" => PaymentClass::Credit,
            _ => PaymentClass::Other,
        }
    }
}

impl fmt::Display for PaymentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
