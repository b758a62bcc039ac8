use std::cmp::Ordering;

use crate::distance::distance_km;
use crate::models::{AnnotatedPlace, Coordinate, Place};

pub const DEFAULT_MIN_SEPARATION_KM: f64 = 0.3;

/// Places within `radius_km` of `origin`, nearest first. Equal distances keep
/// catalog order.
pub fn filter_by_radius(
    places: &[Place],
    origin: Coordinate,
    radius_km: f64,
) -> Vec<AnnotatedPlace> {
    if !(radius_km > 0.0) {
        return Vec::new();
    }

    let mut nearby = places
        .iter()
        .filter_map(|place| {
            let distance = distance_km(origin, place.coordinate);
            (distance <= radius_km).then(|| AnnotatedPlace::new(place.clone(), distance))
        })
        .collect::<Vec<_>>();

    nearby.sort_by(|a, b| {
        a.distance_from_user
            .partial_cmp(&b.distance_from_user)
            .unwrap_or(Ordering::Equal)
    });
    nearby
}

/// Greedy single pass: keeps the first place, then every later place that is
/// at least `min_separation_km` away from all places kept so far. Rejected
/// places are never reconsidered.
pub fn filter_diverse(places: Vec<AnnotatedPlace>, min_separation_km: f64) -> Vec<AnnotatedPlace> {
    let mut kept: Vec<AnnotatedPlace> = Vec::with_capacity(places.len());

    for candidate in places {
        if is_separated(&candidate, &kept, min_separation_km) {
            kept.push(candidate);
        }
    }

    kept
}

pub(crate) fn is_separated<'a>(
    candidate: &AnnotatedPlace,
    kept: impl IntoIterator<Item = &'a AnnotatedPlace>,
    min_separation_km: f64,
) -> bool {
    kept.into_iter()
        .all(|other| distance_km(candidate.coordinate(), other.coordinate()) >= min_separation_km)
}
