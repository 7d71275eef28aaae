//! Day packer: turns a visiting order into timed day plans.
//!
//! The packer is a single state machine. Each place is fed through
//! [`PackerState::step`], which may close the current day and open the next
//! one; [`PackerState::finish`] flushes the last partial day.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::haversine::{self, DEFAULT_SPEED_KMH};
use crate::model::{
    BreakKind, ClockTime, DayPlan, ItineraryItem, Place, TravelSource, TravelTimeMatrix,
    VisitDurationTable,
};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Upper bound for any configured duration.
const MAX_CONFIG_MINUTES: u32 = 7 * MINUTES_PER_DAY;

/// Half-open `[start, end)` range of minutes within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteWindow {
    pub start: u32,
    pub end: u32,
}

impl MinuteWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Window spanning whole hours, e.g. `hours(13, 15)` for 13:00–15:00.
    pub const fn hours(start_hour: u32, end_hour: u32) -> Self {
        Self::new(start_hour * 60, end_hour * 60)
    }

    /// A window that never matches; disables the corresponding meal.
    pub const fn never() -> Self {
        Self::new(0, 0)
    }

    pub fn contains(&self, minute_of_day: u32) -> bool {
        self.start <= minute_of_day && minute_of_day < self.end
    }
}

/// How optional rest breaks are inserted once enough continuous activity has
/// built up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShortBreakPolicy {
    /// Never insert short breaks.
    Disabled,
    /// Insert a break every time the threshold is reached.
    AfterThreshold,
    /// Insert a break with probability `chance` once the threshold is
    /// reached, drawing from an RNG seeded with `seed`.
    Seeded { seed: u64, chance: f64 },
}

/// Packer settings. Every field has a default, so partial documents
/// deserialise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackerConfig {
    /// Hard cap on a day's total minutes.
    pub max_day_minutes: u32,
    /// Clock value at the start of every day.
    pub day_start_minute: u32,
    pub lunch_window: MinuteWindow,
    pub dinner_window: MinuteWindow,
    pub lunch_minutes: u32,
    pub dinner_minutes: u32,
    pub short_break_minutes: u32,
    /// Continuous active minutes after which a short break becomes eligible.
    pub short_break_threshold_minutes: u32,
    /// Speed used to estimate legs missing from the matrix.
    pub assumed_speed_kmh: f64,
    pub short_break: ShortBreakPolicy,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_day_minutes: 720,
            day_start_minute: 540,
            lunch_window: MinuteWindow::hours(13, 15),
            dinner_window: MinuteWindow::hours(19, 22),
            lunch_minutes: 60,
            dinner_minutes: 60,
            short_break_minutes: 15,
            short_break_threshold_minutes: 180,
            assumed_speed_kmh: DEFAULT_SPEED_KMH,
            short_break: ShortBreakPolicy::Disabled,
        }
    }
}

impl PackerConfig {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let invalid = |msg: String| Err(ScheduleError::InvalidConfig(msg));

        if self.max_day_minutes == 0 {
            return invalid("maxDayMinutes must be positive".into());
        }
        for (name, minutes) in [
            ("maxDayMinutes", self.max_day_minutes),
            ("lunchMinutes", self.lunch_minutes),
            ("dinnerMinutes", self.dinner_minutes),
            ("shortBreakMinutes", self.short_break_minutes),
            ("shortBreakThresholdMinutes", self.short_break_threshold_minutes),
        ] {
            if minutes > MAX_CONFIG_MINUTES {
                return invalid(format!(
                    "{name} {minutes} exceeds the limit of {MAX_CONFIG_MINUTES}"
                ));
            }
        }
        if self.day_start_minute >= MINUTES_PER_DAY {
            return invalid(format!(
                "dayStartMinute {} is outside 0..{MINUTES_PER_DAY}",
                self.day_start_minute
            ));
        }
        for (name, window) in [("lunch", self.lunch_window), ("dinner", self.dinner_window)] {
            if window.start > window.end || window.end > MINUTES_PER_DAY {
                return invalid(format!(
                    "{name} window {}..{} is not a range within one day",
                    window.start, window.end
                ));
            }
        }
        if self.lunch_minutes == 0 || self.dinner_minutes == 0 {
            return invalid("meal breaks must last at least one minute".into());
        }
        if !(self.assumed_speed_kmh.is_finite() && self.assumed_speed_kmh > 0.0) {
            return invalid(format!(
                "assumedSpeedKmh must be positive, got {}",
                self.assumed_speed_kmh
            ));
        }
        if self.short_break != ShortBreakPolicy::Disabled && self.short_break_minutes == 0 {
            return invalid("shortBreakMinutes must be positive when short breaks are on".into());
        }
        if let ShortBreakPolicy::Seeded { chance, .. } = self.short_break {
            if !(0.0..=1.0).contains(&chance) {
                return invalid(format!("short break chance {chance} is outside [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Read-only inputs shared by every step of one packing run.
#[derive(Debug, Clone, Copy)]
pub struct PackContext<'a> {
    pub matrix: &'a TravelTimeMatrix,
    pub durations: &'a VisitDurationTable,
    pub config: &'a PackerConfig,
}

impl<'a> PackContext<'a> {
    pub fn new(
        matrix: &'a TravelTimeMatrix,
        durations: &'a VisitDurationTable,
        config: &'a PackerConfig,
    ) -> Self {
        Self {
            matrix,
            durations,
            config,
        }
    }

    /// Minutes from `from` to `to`: the matrix entry when present, otherwise
    /// a haversine estimate.
    fn leg_minutes(&self, from: &Place, to: &Place) -> (u32, TravelSource) {
        match self.matrix.get(from.original_index, to.original_index) {
            Some(seconds) => ((seconds as f64 / 60.0).round() as u32, TravelSource::Matrix),
            None => {
                let minutes = haversine::travel_minutes(
                    from.location(),
                    to.location(),
                    self.config.assumed_speed_kmh,
                );
                debug!(
                    from = from.original_index,
                    to = to.original_index,
                    minutes,
                    "matrix entry missing, using haversine estimate"
                );
                (minutes, TravelSource::Haversine)
            }
        }
    }
}

/// Running state of the packer between places.
#[derive(Debug, Clone)]
pub struct PackerState {
    day_number: u32,
    items: Vec<ItineraryItem>,
    clock: ClockTime,
    day_total: u32,
    /// Minutes of travel and visits since the day started or the last break.
    active_minutes: u32,
    had_lunch: bool,
    had_dinner: bool,
    last: Option<Place>,
    rng: Option<StdRng>,
}

impl PackerState {
    pub fn new(config: &PackerConfig) -> Self {
        let rng = match config.short_break {
            ShortBreakPolicy::Seeded { seed, .. } => Some(StdRng::seed_from_u64(seed)),
            _ => None,
        };
        Self {
            day_number: 1,
            items: Vec::new(),
            clock: ClockTime(config.day_start_minute),
            day_total: 0,
            active_minutes: 0,
            had_lunch: false,
            had_dinner: false,
            last: None,
            rng,
        }
    }

    pub fn day_number(&self) -> u32 {
        self.day_number
    }

    pub fn clock(&self) -> ClockTime {
        self.clock
    }

    pub fn day_total(&self) -> u32 {
        self.day_total
    }

    pub fn items(&self) -> &[ItineraryItem] {
        &self.items
    }

    /// Place one visit, returning the new state and the day it closed, if any.
    pub fn step(mut self, place: &Place, ctx: &PackContext<'_>) -> (Self, Option<DayPlan>) {
        let config = ctx.config;
        let cap = config.max_day_minutes;
        let visit_minutes = ctx.durations.minutes_for(&place.category);
        let mut closed = None;

        // Travel leg, only between places of the same day.
        let leg = match &self.last {
            Some(last) if !self.items.is_empty() => {
                let (minutes, source) = ctx.leg_minutes(last, place);
                Some((last.original_index, minutes, source))
            }
            _ => None,
        };
        if let Some((from_index, minutes, source)) = leg.filter(|(_, minutes, _)| *minutes > 0) {
            if self.day_total.saturating_add(minutes) > cap {
                closed = self.close_day(config);
            } else {
                self.append(minutes, |start_time, end_time| ItineraryItem::Travel {
                    duration_min: minutes,
                    from_index,
                    to_index: place.original_index,
                    source,
                    start_time,
                    end_time,
                });
                self.active_minutes += minutes;
            }
        }

        // At most one meal check per place.
        let minute = self.clock.minute_of_day();
        let meal = if !self.had_lunch && config.lunch_window.contains(minute) {
            Some((BreakKind::Lunch, config.lunch_minutes))
        } else if !self.had_dinner && config.dinner_window.contains(minute) {
            Some((BreakKind::Dinner, config.dinner_minutes))
        } else {
            None
        };
        match meal {
            Some((kind, minutes))
                if self.day_total.saturating_add(minutes + visit_minutes) <= cap =>
            {
                self.insert_break(kind, minutes);
            }
            Some(_) => {
                closed = closed.or(self.close_day(config));
            }
            None => self.maybe_short_break(visit_minutes, config),
        }

        if self.day_total.saturating_add(visit_minutes) > cap {
            closed = closed.or(self.close_day(config));
        }
        self.append(visit_minutes, |start_time, end_time| ItineraryItem::Visit {
            place: place.clone(),
            duration_min: visit_minutes,
            start_time,
            end_time,
        });
        self.active_minutes += visit_minutes;
        self.last = Some(place.clone());

        (self, closed)
    }

    /// Flush the in-progress day, if it has anything in it.
    pub fn finish(self) -> Option<DayPlan> {
        if self.items.is_empty() {
            return None;
        }
        Some(DayPlan {
            day_number: self.day_number,
            items: self.items,
            total_minutes: self.day_total,
        })
    }

    fn append(
        &mut self,
        minutes: u32,
        build: impl FnOnce(ClockTime, ClockTime) -> ItineraryItem,
    ) {
        let start = self.clock;
        let end = start.plus(minutes);
        self.items.push(build(start, end));
        self.clock = end;
        self.day_total += minutes;
    }

    fn insert_break(&mut self, kind: BreakKind, minutes: u32) {
        self.append(minutes, |start_time, end_time| ItineraryItem::Break {
            kind,
            duration_min: minutes,
            start_time,
            end_time,
        });
        match kind {
            BreakKind::Lunch => self.had_lunch = true,
            BreakKind::Dinner => self.had_dinner = true,
            BreakKind::ShortBreak => {}
        }
        self.active_minutes = 0;
    }

    fn maybe_short_break(&mut self, visit_minutes: u32, config: &PackerConfig) {
        if self.items.is_empty() || self.active_minutes < config.short_break_threshold_minutes {
            return;
        }
        if self
            .day_total
            .saturating_add(config.short_break_minutes + visit_minutes)
            > config.max_day_minutes
        {
            return;
        }
        let take = match config.short_break {
            ShortBreakPolicy::Disabled => false,
            ShortBreakPolicy::AfterThreshold => true,
            ShortBreakPolicy::Seeded { chance, .. } => self
                .rng
                .as_mut()
                .is_some_and(|rng| rng.random_bool(chance)),
        };
        if take {
            self.insert_break(BreakKind::ShortBreak, config.short_break_minutes);
        }
    }

    /// Close the current day and open the next one. An empty day is left
    /// open, so no blank day plans are ever emitted.
    fn close_day(&mut self, config: &PackerConfig) -> Option<DayPlan> {
        if self.items.is_empty() {
            return None;
        }
        let day = DayPlan {
            day_number: self.day_number,
            items: std::mem::take(&mut self.items),
            total_minutes: self.day_total,
        };
        debug!(
            day = day.day_number,
            total_minutes = day.total_minutes,
            items = day.items.len(),
            "day closed"
        );

        self.day_number += 1;
        self.clock = ClockTime(config.day_start_minute);
        self.day_total = 0;
        self.active_minutes = 0;
        self.had_lunch = false;
        self.had_dinner = false;
        Some(day)
    }
}

/// Pack `ordered_places` into day plans.
///
/// Fails fast on malformed places or configuration; after validation it
/// always succeeds. An empty list yields no days.
pub fn pack_days(
    ordered_places: &[Place],
    matrix: &TravelTimeMatrix,
    visit_durations: &VisitDurationTable,
    config: &PackerConfig,
) -> Result<Vec<DayPlan>, ScheduleError> {
    config.validate()?;
    visit_durations.validate()?;
    validate_places(ordered_places, visit_durations, config)?;

    let ctx = PackContext::new(matrix, visit_durations, config);
    let mut state = PackerState::new(config);
    let mut days = Vec::new();

    for place in ordered_places {
        let (next, closed) = state.step(place, &ctx);
        days.extend(closed);
        state = next;
    }
    days.extend(state.finish());

    info!(
        places = ordered_places.len(),
        days = days.len(),
        "itinerary packed"
    );
    Ok(days)
}

pub(crate) fn validate_places(
    places: &[Place],
    durations: &VisitDurationTable,
    config: &PackerConfig,
) -> Result<(), ScheduleError> {
    let mut seen = HashSet::with_capacity(places.len());
    for place in places {
        place.validate()?;
        if place.original_index >= places.len() {
            return Err(ScheduleError::IndexOutOfRange {
                id: place.id.clone(),
                index: place.original_index,
                len: places.len(),
            });
        }
        if !seen.insert(place.original_index) {
            return Err(ScheduleError::DuplicateIndex {
                index: place.original_index,
            });
        }
        let minutes = durations.minutes_for(&place.category);
        if minutes > config.max_day_minutes {
            return Err(ScheduleError::VisitExceedsDayCap {
                id: place.id.clone(),
                minutes,
                cap: config.max_day_minutes,
            });
        }
    }
    Ok(())
}
