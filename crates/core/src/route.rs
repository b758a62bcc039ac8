use std::cmp::Ordering;

use crate::config::PlannerSettings;
use crate::distance::distance_km;
use crate::models::AnnotatedPlace;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub stops: Vec<AnnotatedPlace>,
    pub total_distance_km: f64,
    pub estimated_time_hours: f64,
}

/// Nearest-neighbour ordering starting from the first place. This is a greedy
/// heuristic and does not promise the shortest tour.
pub fn order_nearest_neighbor(places: Vec<AnnotatedPlace>) -> Vec<AnnotatedPlace> {
    let mut remaining = places.into_iter();
    let Some(anchor) = remaining.next() else {
        return Vec::new();
    };
    let mut remaining = remaining.collect::<Vec<_>>();
    let mut ordered = Vec::with_capacity(remaining.len() + 1);
    ordered.push(anchor);

    while !remaining.is_empty() {
        let current = ordered[ordered.len() - 1].coordinate();
        // Strict comparison keeps the earliest of equally near places.
        let mut nearest = 0;
        let mut nearest_distance = f64::INFINITY;
        for (index, candidate) in remaining.iter().enumerate() {
            let distance = distance_km(current, candidate.coordinate());
            if distance.partial_cmp(&nearest_distance) == Some(Ordering::Less) {
                nearest = index;
                nearest_distance = distance;
            }
        }
        ordered.push(remaining.remove(nearest));
    }

    ordered
}

/// Sum of consecutive legs, plus the leg back to the first stop when
/// `return_to_start` is set.
pub fn route_distance_km(stops: &[AnnotatedPlace], return_to_start: bool) -> f64 {
    let mut total = stops
        .windows(2)
        .map(|leg| distance_km(leg[0].coordinate(), leg[1].coordinate()))
        .sum::<f64>();

    if return_to_start {
        if let (Some(first), Some(last)) = (stops.first(), stops.last()) {
            total += distance_km(last.coordinate(), first.coordinate());
        }
    }

    total
}

/// Walking time at the configured speed plus a fixed dwell per stop.
pub fn estimate_hours(total_distance_km: f64, stop_count: usize, settings: &PlannerSettings) -> f64 {
    let walking = total_distance_km / settings.walking_speed_kmh;
    let viewing = settings.dwell_hours_per_stop * stop_count as f64;
    walking + viewing
}

pub fn build_route(
    places: Vec<AnnotatedPlace>,
    return_to_start: bool,
    settings: &PlannerSettings,
) -> PlannedRoute {
    let stops = order_nearest_neighbor(places);
    let total_distance_km = route_distance_km(&stops, return_to_start);
    let estimated_time_hours = estimate_hours(total_distance_km, stops.len(), settings);

    PlannedRoute {
        stops,
        total_distance_km,
        estimated_time_hours,
    }
}
