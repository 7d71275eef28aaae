//! Collaborator interfaces.
//!
//! The scheduler consumes a travel-time matrix and hands finished plans to a
//! store; how either is reached is up to the implementing service.

use crate::error::{MatrixError, StoreError};
use crate::model::{DayPlan, TravelTimeMatrix};

/// Provides a travel-time matrix for a set of locations.
///
/// Locations are `(lat, lon)` and the matrix is indexed by their order in the
/// slice, which callers keep equal to each place's `original_index`.
pub trait TravelTimeProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<TravelTimeMatrix, MatrixError>;
}

/// Accepts finished plans for storage.
pub trait ItineraryStore {
    fn save(&self, trip_id: &str, days: &[DayPlan]) -> Result<(), StoreError>;
}

impl<T: TravelTimeProvider + ?Sized> TravelTimeProvider for &T {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<TravelTimeMatrix, MatrixError> {
        (**self).matrix_for(locations)
    }
}

impl TravelTimeProvider for TravelTimeMatrix {
    /// A precomputed matrix, e.g. one cached by the caller.
    fn matrix_for(&self, _locations: &[(f64, f64)]) -> Result<TravelTimeMatrix, MatrixError> {
        Ok(self.clone())
    }
}
