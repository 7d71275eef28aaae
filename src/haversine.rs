//! Haversine travel-time estimates (fallback when the matrix has gaps).
//!
//! Uses great-circle distance to estimate travel time.
//! Less accurate than a routing service (ignores roads) but always available.

use crate::error::MatrixError;
use crate::model::TravelTimeMatrix;
use crate::traits::TravelTimeProvider;

/// Assumed average city travel speed.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimated travel minutes between two points at `speed_kmh`, rounded.
pub fn travel_minutes(from: (f64, f64), to: (f64, f64), speed_kmh: f64) -> u32 {
    (haversine_km(from, to) / speed_kmh * 60.0).round() as u32
}

/// Haversine-based travel-time provider.
///
/// Fills every off-diagonal pair with a straight-line estimate. Useful when
/// the routing service is down and the caller prefers a degraded plan.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn km_to_seconds(&self, km: f64) -> u32 {
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round() as u32
    }
}

impl TravelTimeProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<TravelTimeMatrix, MatrixError> {
        let rows = locations
            .iter()
            .enumerate()
            .map(|(i, from)| {
                locations
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            0
                        } else {
                            self.km_to_seconds(haversine_km(*from, *to))
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(TravelTimeMatrix::from_seconds(rows))
    }
}
