//! Itinerary planner: the one entry point services call.
//!
//! Fetches the travel-time matrix, builds the tour and packs it into days.
//! Every caller goes through here so there is exactly one packing path.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlanError;
use crate::model::{DayPlan, Place, TravelTimeMatrix, VisitDurationTable};
use crate::packer::{PackerConfig, pack_days, validate_places};
use crate::tour::build_tour;
use crate::traits::{ItineraryStore, TravelTimeProvider};

/// What to do when the routing provider fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixFailurePolicy {
    /// Return the provider error to the caller.
    #[default]
    Abort,
    /// Continue with an empty matrix; every leg uses the haversine estimate.
    Degrade,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerOptions {
    pub packer: PackerConfig,
    pub on_matrix_failure: MatrixFailurePolicy,
}

/// A finished plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub days: Vec<DayPlan>,
    /// True when the matrix fetch failed and the plan uses estimates only.
    pub degraded: bool,
}

impl Itinerary {
    pub fn visit_count(&self) -> usize {
        self.days.iter().map(|day| day.visits().count()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ItineraryPlanner<P> {
    provider: P,
    durations: VisitDurationTable,
    options: PlannerOptions,
}

impl<P: TravelTimeProvider> ItineraryPlanner<P> {
    pub fn new(provider: P, durations: VisitDurationTable, options: PlannerOptions) -> Self {
        Self {
            provider,
            durations,
            options,
        }
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plan one request. `places` must carry their input positions as
    /// `original_index`.
    pub fn plan(&self, places: &[Place]) -> Result<Itinerary, PlanError> {
        if places.is_empty() {
            return Ok(Itinerary {
                days: Vec::new(),
                degraded: false,
            });
        }

        // Fail on malformed input before spending a routing request on it.
        validate_places(places, &self.durations, &self.options.packer)?;
        let (matrix, degraded) = self.fetch_matrix(places)?;
        let tour = build_tour(places, &matrix);
        let days = pack_days(&tour, &matrix, &self.durations, &self.options.packer)?;

        info!(
            places = places.len(),
            days = days.len(),
            degraded,
            "itinerary planned"
        );
        Ok(Itinerary { days, degraded })
    }

    /// Plan and hand the result to `store` under `trip_id`.
    pub fn plan_and_store<S: ItineraryStore + ?Sized>(
        &self,
        trip_id: &str,
        places: &[Place],
        store: &S,
    ) -> Result<Itinerary, PlanError> {
        let itinerary = self.plan(places)?;
        store.save(trip_id, &itinerary.days)?;
        Ok(itinerary)
    }

    fn fetch_matrix(&self, places: &[Place]) -> Result<(TravelTimeMatrix, bool), PlanError> {
        // Validated indices are exactly 0..len.
        let mut ordered: Vec<&Place> = places.iter().collect();
        ordered.sort_by_key(|place| place.original_index);
        let locations: Vec<(f64, f64)> = ordered.iter().map(|place| place.location()).collect();

        match self.provider.matrix_for(&locations) {
            Ok(matrix) => {
                let missing = places
                    .iter()
                    .flat_map(|from| places.iter().map(move |to| (from, to)))
                    .filter(|(from, to)| {
                        from.original_index != to.original_index
                            && matrix.get(from.original_index, to.original_index).is_none()
                    })
                    .count();
                if missing > 0 {
                    warn!(missing, "travel-time matrix is incomplete");
                }
                Ok((matrix, false))
            }
            Err(err) => match self.options.on_matrix_failure {
                MatrixFailurePolicy::Abort => Err(err.into()),
                MatrixFailurePolicy::Degrade => {
                    warn!(error = %err, "matrix fetch failed, planning with estimates");
                    Ok((TravelTimeMatrix::unavailable(), true))
                }
            },
        }
    }
}

impl<P: TravelTimeProvider + Sync> ItineraryPlanner<P> {
    /// Plan independent requests in parallel. Results keep request order.
    pub fn plan_batch(&self, requests: &[Vec<Place>]) -> Vec<Result<Itinerary, PlanError>> {
        requests
            .par_iter()
            .map(|places| self.plan(places))
            .collect()
    }
}
