//! Demographics report types.

use serde::Serialize;

use crate::variables::AcsVariable;

/// Variable values for one geography. `values` is positionally aligned with
/// the report's variable list; `None` is a value the Bureau withheld or does
/// not publish for the geography.
#[derive(Clone, Debug, Serialize)]
pub struct GeographyProfile {
    /// Geography identifier: a ZCTA code or a state FIPS code.
    pub geo_id: String,
    /// The Bureau's display name for the geography.
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl GeographyProfile {
    /// Value for a variable code, if the report carries that variable.
    pub fn value(&self, variables: &[AcsVariable], code: &str) -> Option<f64> {
        let idx = variables.iter().position(|v| v.code == code)?;
        self.values.get(idx).copied().flatten()
    }
}

/// The demographics comparison: the store's surrounding ZCTAs side by side
/// with the containing state.
#[derive(Clone, Debug, Serialize)]
pub struct DemographicsReport {
    pub variables: Vec<AcsVariable>,
    /// One profile per ZCTA intersecting the requested radius.
    pub local: Vec<GeographyProfile>,
    /// The state-level profile the local values compare against.
    pub state: GeographyProfile,
}
