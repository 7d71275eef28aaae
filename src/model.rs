//! Data model shared by the tour builder and the day packer.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ScheduleError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A point of interest to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    /// Only used to look up a visit duration.
    pub category: String,
    pub lat: f64,
    pub lon: f64,
    /// Position in the caller's input array. This is the matrix key and must
    /// survive every reordering.
    pub original_index: usize,
}

impl Place {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        (lat, lon): (f64, f64),
        original_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            lat,
            lon,
            original_index,
        }
    }

    /// Location coordinates (lat, lon).
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    pub(crate) fn validate(&self) -> Result<(), ScheduleError> {
        let finite = self.lat.is_finite() && self.lon.is_finite();
        if !finite || self.lat.abs() > 90.0 || self.lon.abs() > 180.0 {
            return Err(ScheduleError::InvalidCoordinates {
                id: self.id.clone(),
                lat: self.lat,
                lon: self.lon,
            });
        }
        Ok(())
    }
}

/// Loosely-typed place as it arrives from a request body.
///
/// Converting into [`Place`] fails on missing coordinates or index instead of
/// silently defaulting them to zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub original_index: Option<usize>,
}

impl PlaceInput {
    /// Convert into a [`Place`]; `position` is only used in error messages.
    pub fn into_place(self, position: usize) -> Result<Place, ScheduleError> {
        let missing = |field| ScheduleError::MissingField {
            index: position,
            field,
        };
        let id = self.id.ok_or_else(|| missing("id"))?;
        let lat = self.lat.ok_or_else(|| missing("lat"))?;
        let lon = self.lon.ok_or_else(|| missing("lon"))?;
        let original_index = self.original_index.ok_or_else(|| missing("originalIndex"))?;

        let place = Place {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            category: self.category.unwrap_or_default(),
            lat,
            lon,
            original_index,
        };
        place.validate()?;
        Ok(place)
    }

    pub fn into_places(inputs: Vec<PlaceInput>) -> Result<Vec<Place>, ScheduleError> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(position, input)| input.into_place(position))
            .collect()
    }
}

/// Pairwise travel times in seconds, indexed by `original_index`.
///
/// `None` means the routing provider had no route for the pair. Rows or
/// columns beyond the stored table also read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TravelTimeMatrix {
    rows: Vec<Vec<Option<u32>>>,
}

impl TravelTimeMatrix {
    pub fn new(rows: Vec<Vec<Option<u32>>>) -> Self {
        Self { rows }
    }

    /// A complete matrix with every entry present.
    pub fn from_seconds(rows: Vec<Vec<u32>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Some).collect())
                .collect(),
        }
    }

    /// A matrix with no entries at all; every lookup falls back.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<u32> {
        self.rows.get(from).and_then(|row| row.get(to)).copied().flatten()
    }

    pub fn set(&mut self, from: usize, to: usize, seconds: Option<u32>) {
        let size = self.rows.len().max(from + 1).max(to + 1);
        for row in &mut self.rows {
            row.resize(size, None);
        }
        self.rows.resize_with(size, || vec![None; size]);
        self.rows[from][to] = seconds;
    }

    /// Number of stored rows.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Option<u32>>] {
        &self.rows
    }

    /// Count of absent off-diagonal entries among the first `n` indices.
    pub fn missing_pairs(&self, n: usize) -> usize {
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|&(i, j)| i != j && self.get(i, j).is_none())
            .count()
    }
}

/// Default visit length per category, in minutes.
///
/// Serialises as a flat map with a mandatory `default` key, e.g.
/// `{"museum": 120, "default": 90}`. Category keys are matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, u32>", into = "HashMap<String, u32>")]
pub struct VisitDurationTable {
    default: u32,
    categories: HashMap<String, u32>,
}

impl VisitDurationTable {
    pub fn new(default_minutes: u32) -> Self {
        Self {
            default: default_minutes,
            categories: HashMap::new(),
        }
    }

    pub fn with_category(mut self, category: &str, minutes: u32) -> Self {
        self.categories.insert(normalize_category(category), minutes);
        self
    }

    pub fn default_minutes(&self) -> u32 {
        self.default
    }

    pub fn minutes_for(&self, category: &str) -> u32 {
        self.categories
            .get(&normalize_category(category))
            .copied()
            .unwrap_or(self.default)
    }

    pub(crate) fn validate(&self) -> Result<(), ScheduleError> {
        if self.default == 0 {
            return Err(ScheduleError::InvalidDuration {
                category: "default".to_string(),
            });
        }
        match self.categories.iter().find(|(_, minutes)| **minutes == 0) {
            Some((category, _)) => Err(ScheduleError::InvalidDuration {
                category: category.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<HashMap<String, u32>> for VisitDurationTable {
    type Error = ScheduleError;

    fn try_from(mut raw: HashMap<String, u32>) -> Result<Self, Self::Error> {
        let default = raw.remove("default").ok_or_else(|| {
            ScheduleError::InvalidConfig("visit duration table needs a `default` entry".into())
        })?;
        let table = raw
            .into_iter()
            .fold(Self::new(default), |table, (category, minutes)| {
                table.with_category(&category, minutes)
            });
        table.validate()?;
        Ok(table)
    }
}

impl From<VisitDurationTable> for HashMap<String, u32> {
    fn from(table: VisitDurationTable) -> Self {
        let mut raw = table.categories;
        raw.insert("default".to_string(), table.default);
        raw
    }
}

fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Minutes since midnight of the plan day, unwrapped.
///
/// Day-budget arithmetic uses the raw count; display wraps modulo 24h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(pub u32);

impl ClockTime {
    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Minute of the (wrapped) day, 0..1440.
    pub fn minute_of_day(self) -> u32 {
        self.0 % MINUTES_PER_DAY
    }

    pub fn plus(self, minutes: u32) -> Self {
        ClockTime(self.0 + minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wrapped = self.minute_of_day();
        write!(f, "{:02}:{:02}", wrapped / 60, wrapped % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where a travel leg's duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelSource {
    Matrix,
    /// Great-circle estimate because the matrix entry was absent.
    Haversine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BreakKind {
    Lunch,
    Dinner,
    #[serde(rename = "Short break")]
    ShortBreak,
}

impl BreakKind {
    pub fn label(self) -> &'static str {
        match self {
            BreakKind::Lunch => "Lunch",
            BreakKind::Dinner => "Dinner",
            BreakKind::ShortBreak => "Short break",
        }
    }
}

/// One scheduled unit within a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItineraryItem {
    #[serde(rename_all = "camelCase")]
    Travel {
        duration_min: u32,
        from_index: usize,
        to_index: usize,
        source: TravelSource,
        start_time: ClockTime,
        end_time: ClockTime,
    },
    #[serde(rename_all = "camelCase")]
    Visit {
        place: Place,
        duration_min: u32,
        start_time: ClockTime,
        end_time: ClockTime,
    },
    #[serde(rename_all = "camelCase")]
    Break {
        #[serde(rename = "label")]
        kind: BreakKind,
        duration_min: u32,
        start_time: ClockTime,
        end_time: ClockTime,
    },
}

impl ItineraryItem {
    pub fn duration_min(&self) -> u32 {
        match self {
            ItineraryItem::Travel { duration_min, .. }
            | ItineraryItem::Visit { duration_min, .. }
            | ItineraryItem::Break { duration_min, .. } => *duration_min,
        }
    }

    pub fn start_time(&self) -> ClockTime {
        match self {
            ItineraryItem::Travel { start_time, .. }
            | ItineraryItem::Visit { start_time, .. }
            | ItineraryItem::Break { start_time, .. } => *start_time,
        }
    }

    pub fn end_time(&self) -> ClockTime {
        match self {
            ItineraryItem::Travel { end_time, .. }
            | ItineraryItem::Visit { end_time, .. }
            | ItineraryItem::Break { end_time, .. } => *end_time,
        }
    }

    pub fn place(&self) -> Option<&Place> {
        match self {
            ItineraryItem::Visit { place, .. } => Some(place),
            _ => None,
        }
    }

    pub fn break_kind(&self) -> Option<BreakKind> {
        match self {
            ItineraryItem::Break { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A timed sequence of items constrained to one day's budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based.
    pub day_number: u32,
    pub items: Vec<ItineraryItem>,
    pub total_minutes: u32,
}

impl DayPlan {
    pub fn visits(&self) -> impl Iterator<Item = &Place> {
        self.items.iter().filter_map(ItineraryItem::place)
    }

    pub fn travel_minutes(&self) -> u32 {
        self.items
            .iter()
            .filter(|item| matches!(item, ItineraryItem::Travel { .. }))
            .map(ItineraryItem::duration_min)
            .sum()
    }

    pub fn break_count(&self, kind: BreakKind) -> usize {
        self.items
            .iter()
            .filter(|item| item.break_kind() == Some(kind))
            .count()
    }
}
