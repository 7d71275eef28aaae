//! Test fixtures for itinerary-planner.
//!
//! Provides realistic test data including:
//! - Real Paris landmarks (from OpenStreetMap)
//! - Invariant checks shared by the scenario and property tests

#![allow(dead_code)]

pub mod paris_locations;

use std::collections::HashMap;

use itinerary_planner::{BreakKind, DayPlan, ItineraryItem, Place};

pub use paris_locations::*;

/// A place at `(lat, lon)` with the default category.
pub fn place_at(id: &str, index: usize, lat: f64, lon: f64) -> Place {
    Place::new(id, id, "sight", (lat, lon), index)
}

/// Assert every per-day invariant of a packed itinerary.
pub fn assert_day_invariants(days: &[DayPlan], max_day_minutes: u32) {
    for (position, day) in days.iter().enumerate() {
        assert_eq!(day.day_number as usize, position + 1, "day numbers are 1-based and dense");
        assert!(!day.items.is_empty(), "day {} is empty", day.day_number);
        assert!(
            day.total_minutes <= max_day_minutes,
            "day {} has {} minutes, cap is {}",
            day.day_number,
            day.total_minutes,
            max_day_minutes
        );

        let sum: u32 = day.items.iter().map(ItineraryItem::duration_min).sum();
        assert_eq!(sum, day.total_minutes, "day {} total mismatch", day.day_number);

        for pair in day.items.windows(2) {
            assert_eq!(
                pair[0].end_time(),
                pair[1].start_time(),
                "day {} items are not contiguous",
                day.day_number
            );
        }
        for item in &day.items {
            assert_eq!(item.start_time().plus(item.duration_min()), item.end_time());
        }

        assert!(day.break_count(BreakKind::Lunch) <= 1);
        assert!(day.break_count(BreakKind::Dinner) <= 1);
    }
}

/// Visits across all days, in day-then-order sequence.
pub fn visit_ids(days: &[DayPlan]) -> Vec<String> {
    days.iter()
        .flat_map(|day| day.visits().map(|place| place.id.clone()))
        .collect()
}

/// Count of each id, for comparing visit multisets.
pub fn id_counts<'a>(ids: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}
