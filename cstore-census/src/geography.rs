//! Radius-to-ZCTA resolution.

use arrow::record_batch::RecordBatch;
use cstore_model::batch::{f64_at, f64_col, str_at, str_col};
use cstore_model::schema::col;
use cstore_result::{Error, Result};
use rustc_hash::FxHashMap;

const EARTH_RADIUS_MILES: f64 = 3_958.8;

/// A candidate census geography: a ZCTA and its centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct ZctaCentroid {
    pub zcta: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance between two coordinates, in miles.
pub fn haversine_miles(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let d_lat = (lat_b - lat_a).to_radians();
    let d_lon = (lon_b - lon_a).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// The ZCTAs whose centroids fall within `radius_miles` of a point, sorted
/// by code. No intersecting geography is `Error::GeoResolution`.
pub fn resolve_radius(
    latitude: f64,
    longitude: f64,
    radius_miles: f64,
    candidates: &[ZctaCentroid],
) -> Result<Vec<String>> {
    if radius_miles <= 0.0 {
        return Err(Error::InvalidArgumentError(format!(
            "radius must be positive, got {radius_miles}"
        )));
    }
    let mut zctas: Vec<String> = candidates
        .iter()
        .filter(|c| haversine_miles(latitude, longitude, c.latitude, c.longitude) <= radius_miles)
        .map(|c| c.zcta.clone())
        .collect();
    zctas.sort();
    zctas.dedup();
    if zctas.is_empty() {
        return Err(Error::GeoResolution(format!(
            "no census geography within {radius_miles} miles of ({latitude}, {longitude})"
        )));
    }
    Ok(zctas)
}

/// Derive ZCTA centroid candidates from the stores table: one candidate per
/// distinct ZIP5, located at the mean of the stores carrying it. Stores
/// without coordinates or a ZIP contribute nothing.
pub fn centroids_from_stores(stores: &RecordBatch) -> Result<Vec<ZctaCentroid>> {
    let zips = str_col(stores, col::ZIP_CODE)?;
    let lats = f64_col(stores, col::LATITUDE)?;
    let lons = f64_col(stores, col::LONGITUDE)?;

    let mut sums: FxHashMap<String, (f64, f64, usize)> = FxHashMap::default();
    for row in 0..stores.num_rows() {
        let Some(zip) = str_at(zips, row) else {
            continue;
        };
        // ZIP+4 values collapse to their ZIP5 tabulation area.
        let zip5 = zip.split('-').next().unwrap_or(zip).trim();
        if zip5.is_empty() {
            continue;
        }
        let (Some(lat), Some(lon)) = (f64_at(lats, row), f64_at(lons, row)) else {
            continue;
        };
        let entry = sums.entry(zip5.to_owned()).or_insert((0.0, 0.0, 0));
        entry.0 += lat;
        entry.1 += lon;
        entry.2 += 1;
    }

    let mut centroids: Vec<ZctaCentroid> = sums
        .into_iter()
        .map(|(zcta, (lat_sum, lon_sum, n))| ZctaCentroid {
            zcta,
            latitude: lat_sum / n as f64,
            longitude: lon_sum / n as f64,
        })
        .collect();
    centroids.sort_by(|a, b| a.zcta.cmp(&b.zcta));
    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rigby() -> ZctaCentroid {
        ZctaCentroid {
            zcta: "83442".into(),
            latitude: 43.672,
            longitude: -111.915,
        }
    }

    fn rexburg() -> ZctaCentroid {
        ZctaCentroid {
            zcta: "83440".into(),
            latitude: 43.826,
            longitude: -111.789,
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_at_the_same_point() {
        let a = rigby();
        let b = rexburg();
        let ab = haversine_miles(a.latitude, a.longitude, b.latitude, b.longitude);
        let ba = haversine_miles(b.latitude, b.longitude, a.latitude, a.longitude);
        assert!((ab - ba).abs() < 1e-9);
        assert!(haversine_miles(a.latitude, a.longitude, a.latitude, a.longitude) < 1e-9);
        // Rigby to Rexburg is roughly a dozen miles.
        assert!(ab > 8.0 && ab < 16.0, "got {ab}");
    }

    #[test]
    fn radius_selects_only_nearby_zctas() {
        let candidates = vec![rigby(), rexburg()];
        let near = resolve_radius(43.672, -111.915, 5.0, &candidates).unwrap();
        assert_eq!(near, vec!["83442".to_string()]);

        let wide = resolve_radius(43.672, -111.915, 25.0, &candidates).unwrap();
        assert_eq!(wide, vec!["83440".to_string(), "83442".to_string()]);
    }

    #[test]
    fn empty_radius_is_a_geo_resolution_error() {
        let candidates = vec![rigby()];
        let err = resolve_radius(0.0, 0.0, 5.0, &candidates).unwrap_err();
        assert!(matches!(err, cstore_result::Error::GeoResolution(_)));

        let err = resolve_radius(43.672, -111.915, 5.0, &[]).unwrap_err();
        assert!(matches!(err, cstore_result::Error::GeoResolution(_)));
    }

    #[test]
    fn store_centroids_collapse_zip_plus_four() {
        use cstore_test_utils::{stores_batch, StoreRow};
        let batch = stores_batch(&[
            StoreRow::default(),
            StoreRow {
                id: "103",
                zip: "83442-1234",
                lat: 43.680,
                lon: -111.920,
                ..StoreRow::default()
            },
        ]);
        let centroids = centroids_from_stores(&batch).unwrap();
        assert_eq!(centroids.len(), 1);
        assert_eq!(centroids[0].zcta, "83442");
        assert!((centroids[0].latitude - 43.676).abs() < 1e-9);
    }
}
