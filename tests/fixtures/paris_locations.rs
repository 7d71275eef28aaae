//! Real Paris landmarks for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. They sit within a few kilometres
//! of each other, like a typical city trip.

use itinerary_planner::Place;

/// A named landmark with a category and coordinates.
#[derive(Debug, Clone)]
pub struct Landmark {
    pub name: &'static str,
    pub category: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Landmark {
    pub const fn new(name: &'static str, category: &'static str, lat: f64, lon: f64) -> Self {
        Self {
            name,
            category,
            lat,
            lon,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

pub const MUSEUMS: &[Landmark] = &[
    Landmark::new("Louvre", "museum", 48.8606, 2.3376),
    Landmark::new("Musée d'Orsay", "museum", 48.8600, 2.3266),
    Landmark::new("Centre Pompidou", "museum", 48.8607, 2.3522),
    Landmark::new("Musée Rodin", "museum", 48.8553, 2.3159),
    Landmark::new("Musée de l'Orangerie", "museum", 48.8638, 2.3227),
];

pub const PARKS: &[Landmark] = &[
    Landmark::new("Jardin du Luxembourg", "park", 48.8462, 2.3372),
    Landmark::new("Jardin des Tuileries", "park", 48.8635, 2.3275),
    Landmark::new("Parc des Buttes-Chaumont", "park", 48.8809, 2.3828),
];

pub const MONUMENTS: &[Landmark] = &[
    Landmark::new("Eiffel Tower", "monument", 48.8584, 2.2945),
    Landmark::new("Arc de Triomphe", "monument", 48.8738, 2.2950),
    Landmark::new("Notre-Dame", "church", 48.8530, 2.3499),
    Landmark::new("Sacré-Cœur", "church", 48.8867, 2.3431),
    Landmark::new("Panthéon", "monument", 48.8462, 2.3464),
];

pub const RESTAURANTS: &[Landmark] = &[
    Landmark::new("Le Procope", "restaurant", 48.8530, 2.3389),
    Landmark::new("Bouillon Chartier", "restaurant", 48.8719, 2.3431),
];

pub fn all_landmarks() -> Vec<Landmark> {
    let mut all = Vec::new();
    all.extend_from_slice(MUSEUMS);
    all.extend_from_slice(PARKS);
    all.extend_from_slice(MONUMENTS);
    all.extend_from_slice(RESTAURANTS);
    all
}

/// Turn landmarks into places, numbering them by input position.
pub fn places(landmarks: &[Landmark]) -> Vec<Place> {
    landmarks
        .iter()
        .enumerate()
        .map(|(index, landmark)| {
            Place::new(
                format!("poi-{index}"),
                landmark.name,
                landmark.category,
                landmark.coords(),
                index,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_paris() {
        for landmark in all_landmarks() {
            assert!(
                landmark.lat > 48.81 && landmark.lat < 48.91,
                "{} lat out of range: {}",
                landmark.name,
                landmark.lat
            );
            assert!(
                landmark.lon > 2.22 && landmark.lon < 2.47,
                "{} lon out of range: {}",
                landmark.name,
                landmark.lon
            );
        }
    }
}
