//! Great-circle distance between station coordinates.

use haversine::{distance, Location as HaversineLocation, Units};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographical coordinate: latitude first (index 0), longitude second (index 1),
/// both in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Invalid coordinate: latitude {latitude} must be in [-90, 90] and longitude {longitude} in [-180, 180]")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Great-circle surface distance between two coordinates, in kilometers.
pub fn distance_km(a: LatLon, b: LatLon) -> Result<f64, GeoError> {
    validate(a)?;
    validate(b)?;
    Ok(distance(
        HaversineLocation {
            latitude: a.0,
            longitude: a.1,
        },
        HaversineLocation {
            latitude: b.0,
            longitude: b.1,
        },
        Units::Kilometers,
    ))
}

fn validate(point: LatLon) -> Result<(), GeoError> {
    let LatLon(latitude, longitude) = point;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::InvalidCoordinate {
            latitude,
            longitude,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_have_zero_distance() {
        let cercadinho = LatLon(-19.9, -43.9);
        assert_eq!(distance_km(cercadinho, cercadinho).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let belo_horizonte = LatLon(-19.92, -43.94);
        let uberlandia = LatLon(-18.92, -48.28);
        let there = distance_km(belo_horizonte, uberlandia).unwrap();
        let back = distance_km(uberlandia, belo_horizonte).unwrap();
        assert_eq!(there, back);
        // BH to Uberlandia is roughly 450 km as the crow flies.
        assert!(there > 400.0 && there < 500.0, "got {there}");
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = distance_km(LatLon(91.0, 0.0), LatLon(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));

        let err = distance_km(LatLon(0.0, 0.0), LatLon(0.0, -180.5)).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));
    }
}
