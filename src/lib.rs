//! itinerary-planner core
//!
//! Turns an unordered set of points of interest into a day-by-day visiting
//! plan: a greedy tour over a travel-time matrix, then a day packer that
//! inserts travel legs and breaks under a daily cap.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod tour;
pub mod packer;
pub mod planner;
pub mod osrm;

pub use error::{MatrixError, PlanError, ScheduleError, StoreError};
pub use model::{
    BreakKind, ClockTime, DayPlan, ItineraryItem, Place, PlaceInput, TravelSource,
    TravelTimeMatrix, VisitDurationTable,
};
pub use packer::{PackerConfig, ShortBreakPolicy, pack_days};
pub use planner::{Itinerary, ItineraryPlanner, MatrixFailurePolicy, PlannerOptions};
pub use tour::build_tour;
