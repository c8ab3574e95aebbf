//! Category classification helpers.
//!
//! "Excluding fuel" in the business questions means excluding rows whose
//! product category classifies as fuel; the scan type alone does not decide.
//! A null category is the unknown bucket: it classifies as neither fuel nor
//! beverage and is never dropped.

/// Label used wherever a null category or brand needs a display bucket.
pub const UNKNOWN_BUCKET: &str = "Unknown";

const FUEL_KEYWORDS: &[&str] = &["fuel", "gasoline", "diesel", "propane", "kerosene"];

const BEVERAGE_KEYWORDS: &[&str] = &["beverage", "drink", "soda", "juice", "water", "energy"];

fn contains_keyword(value: &str, keywords: &[&str]) -> bool {
    let lower = value.to_ascii_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

/// Whether a product category classifies as fuel.
pub fn is_fuel_category(category: Option<&str>) -> bool {
    category.is_some_and(|c| contains_keyword(c, FUEL_KEYWORDS))
}

/// Whether a category or subcategory pair classifies as a packaged beverage.
pub fn is_beverage_category(category: Option<&str>, subcategory: Option<&str>) -> bool {
    category.is_some_and(|c| contains_keyword(c, BEVERAGE_KEYWORDS))
        || subcategory.is_some_and(|s| contains_keyword(s, BEVERAGE_KEYWORDS))
}

/// Resolve an optional category/brand value to its display bucket.
pub fn bucket(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN_BUCKET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_matches_are_category_based() {
        assert!(is_fuel_category(Some("Fuel")));
        assert!(is_fuel_category(Some("Diesel Fuel")));
        assert!(is_fuel_category(Some("GASOLINE")));
        assert!(!is_fuel_category(Some("Packaged Beverages")));
        assert!(!is_fuel_category(None));
    }

    #[test]
    fn beverages_match_on_either_level() {
        assert!(is_beverage_category(Some("Packaged Beverages"), None));
        assert!(is_beverage_category(None, Some("Energy Drinks")));
        assert!(is_beverage_category(Some("Snacks"), Some("Juice Boxes")));
        assert!(!is_beverage_category(Some("Snacks"), Some("Chips")));
        assert!(!is_beverage_category(None, None));
    }

    #[test]
    fn null_values_bucket_as_unknown() {
        assert_eq!(bucket(None), UNKNOWN_BUCKET);
        assert_eq!(bucket(Some("")), UNKNOWN_BUCKET);
        assert_eq!(bucket(Some("Monster")), "Monster");
    }
}
