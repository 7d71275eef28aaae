//! Greedy nearest-neighbor tour construction.
//!
//! Starting from the first input place, always step to the unvisited place
//! with the smallest matrix travel time. O(n²), which is fine for the tens of
//! places a trip holds.

use tracing::{debug, warn};

use crate::model::{Place, TravelTimeMatrix};

/// Order `places` into a visiting sequence.
///
/// Ties go to the lowest `original_index`. When no remaining candidate has a
/// matrix entry from the current place, the lowest unvisited `original_index`
/// is taken, so the result degrades to index order instead of failing.
pub fn build_tour(places: &[Place], matrix: &TravelTimeMatrix) -> Vec<Place> {
    if places.len() <= 1 {
        return places.to_vec();
    }

    // Candidate scan order: original index, then input position.
    let mut scan: Vec<usize> = (0..places.len()).collect();
    scan.sort_by_key(|&i| places[i].original_index);

    let mut visited = vec![false; places.len()];
    let mut order = Vec::with_capacity(places.len());
    let mut current = 0;
    visited[current] = true;
    order.push(current);

    while order.len() < places.len() {
        let from = places[current].original_index;
        let mut best: Option<(usize, u32)> = None;

        for &candidate in &scan {
            if visited[candidate] {
                continue;
            }
            let Some(seconds) = matrix.get(from, places[candidate].original_index) else {
                continue;
            };
            if best.is_none_or(|(_, best_seconds)| seconds < best_seconds) {
                best = Some((candidate, seconds));
            }
        }

        let next = match best {
            Some((next, _)) => next,
            None => {
                // Loop condition guarantees an unvisited place remains.
                let next = scan
                    .iter()
                    .copied()
                    .find(|&i| !visited[i])
                    .unwrap_or(current);
                warn!(
                    from = %places[current].id,
                    to = %places[next].id,
                    "no matrix entries from place, falling back to index order"
                );
                next
            }
        };

        visited[next] = true;
        order.push(next);
        current = next;
    }

    debug!(places = places.len(), "tour built");
    order.into_iter().map(|i| places[i].clone()).collect()
}
