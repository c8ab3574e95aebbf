//! Scan-type enumeration for transaction line items.

use std::fmt;

/// How a line item was captured at the register.
///
/// The snapshot stores these as upper-case strings; any other value is a
/// data-quality finding, counted by the validator and otherwise ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanType {
    /// Barcode scan resolving to a trade item number.
    Gtin,
    /// Price-lookup code keyed by the cashier.
    Plu,
    /// Scan captured but the barcode failed to parse.
    FmtErr,
    /// No scan at all (fuel dispenses, manual amounts).
    NonScan,
}

impl ScanType {
    pub const ALL: [ScanType; 4] = [
        ScanType::Gtin,
        ScanType::Plu,
        ScanType::FmtErr,
        ScanType::NonScan,
    ];

    /// Parse the snapshot's string form. Returns `None` for values outside
    /// the enumeration.
    pub fn parse(value: &str) -> Option<ScanType> {
        match value {
            "GTIN" => Some(ScanType::Gtin),
            "PLU" => Some(ScanType::Plu),
            "FMT_ERR" => Some(ScanType::FmtErr),
            "NONSCAN" => Some(ScanType::NonScan),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Gtin => "GTIN",
            ScanType::Plu => "PLU",
            ScanType::FmtErr => "FMT_ERR",
            ScanType::NonScan => "NONSCAN",
        }
    }

    /// Whether the item can carry a resolvable product identifier.
    pub fn scannable(&self) -> bool {
        !matches!(self, ScanType::NonScan)
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
