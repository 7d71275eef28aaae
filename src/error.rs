//! Error types for scheduling, matrix retrieval and persistence.

use thiserror::Error;

/// Precondition violations detected before packing starts.
///
/// Missing matrix entries and empty input are not errors; see
/// [`crate::packer::pack_days`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// A loosely-typed place was missing a required field.
    #[error("place at input position {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("place `{id}` has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { id: String, lat: f64, lon: f64 },

    /// Indices must be exactly the input positions `0..len`.
    #[error("place `{id}` has original index {index} outside 0..{len}")]
    IndexOutOfRange { id: String, index: usize, len: usize },

    /// Two places claim the same matrix row.
    #[error("original index {index} is used by more than one place")]
    DuplicateIndex { index: usize },

    #[error("visit duration for category `{category}` must be positive")]
    InvalidDuration { category: String },

    /// A single visit is longer than any day may be.
    #[error("place `{id}` needs {minutes} minutes but a day is capped at {cap}")]
    VisitExceedsDayCap { id: String, minutes: u32, cap: u32 },

    #[error("invalid packer configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the routing collaborator.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("routing request failed")]
    Http(#[from] reqwest::Error),

    /// The service answered but reported a failure code.
    #[error("routing service returned `{code}`: {message}")]
    Upstream { code: String, message: String },

    #[error("routing service returned a {rows}x{cols} matrix for {expected} locations")]
    Shape {
        expected: usize,
        rows: usize,
        cols: usize,
    },
}

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
#[error("failed to store itinerary for trip `{trip_id}`: {reason}")]
pub struct StoreError {
    pub trip_id: String,
    pub reason: String,
}

/// Everything [`crate::planner::ItineraryPlanner`] can fail with.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("travel-time matrix unavailable")]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
