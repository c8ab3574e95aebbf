//! The ACS 5-year variables the demographics page asks for.

use serde::Serialize;

/// One named ACS variable: the Census code and the label shown to readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AcsVariable {
    pub code: &'static str,
    pub label: &'static str,
}

/// The default variable set, thirteen demographic measures spanning
/// population, income, housing, education, commuting, and poverty.
pub const DEFAULT_VARIABLES: &[AcsVariable] = &[
    AcsVariable {
        code: "B01001_001E",
        label: "Total Population",
    },
    AcsVariable {
        code: "B01002_001E",
        label: "Median Age",
    },
    AcsVariable {
        code: "B19013_001E",
        label: "Median Household Income",
    },
    AcsVariable {
        code: "B25064_001E",
        label: "Median Gross Rent",
    },
    AcsVariable {
        code: "B25077_001E",
        label: "Median Home Value",
    },
    AcsVariable {
        code: "B25001_001E",
        label: "Total Housing Units",
    },
    AcsVariable {
        code: "B15003_022E",
        label: "Bachelor's Degree",
    },
    AcsVariable {
        code: "B15003_023E",
        label: "Master's Degree",
    },
    AcsVariable {
        code: "B15003_024E",
        label: "Professional Degree",
    },
    AcsVariable {
        code: "B15003_025E",
        label: "Doctorate Degree",
    },
    AcsVariable {
        code: "B08301_010E",
        label: "Public Transportation",
    },
    AcsVariable {
        code: "B08301_019E",
        label: "Work from Home",
    },
    AcsVariable {
        code: "B17001_002E",
        label: "Below Poverty Level",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_has_at_least_ten_named_variables() {
        assert!(DEFAULT_VARIABLES.len() >= 10);
        for var in DEFAULT_VARIABLES {
            assert!(var.code.ends_with('E'));
            assert!(!var.label.is_empty());
        }
    }
}
