use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::PlannerSettings;
use crate::error::PlannerError;
use crate::filter::is_separated;
use crate::models::{
    AnnotatedPlace, CandidateSummary, RecommendationRequest, Selection, UserProfile,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Exactly the requested number of places, in candidate order.
    pub places: Vec<AnnotatedPlace>,
    pub matched: usize,
    pub backfilled: usize,
}

pub fn ensure_enough_candidates(
    candidates: &[AnnotatedPlace],
    target_count: usize,
    radius_km: f64,
    min_separation_km: f64,
) -> Result<(), PlannerError> {
    if candidates.len() < target_count {
        return Err(PlannerError::InsufficientCandidates {
            available: candidates.len(),
            requested: target_count,
            radius_km,
            min_separation_km,
        });
    }
    Ok(())
}

/// The payload sent to the recommender: at most `max_context_places`
/// candidates, descriptions cut to `description_chars` characters.
pub fn build_recommendation_request(
    profile: &UserProfile,
    candidates: &[AnnotatedPlace],
    target_count: usize,
    settings: &PlannerSettings,
) -> RecommendationRequest {
    let candidates = candidates
        .iter()
        .take(settings.max_context_places)
        .map(|candidate| CandidateSummary {
            name: candidate.place.name.clone(),
            address: candidate.place.address.clone(),
            distance_km: candidate.distance_from_user,
            description: truncate_chars(&candidate.place.description, settings.description_chars),
        })
        .collect();

    RecommendationRequest {
        profile: profile.clone(),
        target_count,
        candidates,
    }
}

/// Matches the recommender's picks back to candidates and backfills any
/// shortfall from the candidate list itself.
///
/// Callers must have checked the pool with [`ensure_enough_candidates`]; with
/// a large enough pool the result always holds exactly `target_count` places.
pub fn reconcile(
    candidates: &[AnnotatedPlace],
    selections: &[Selection],
    target_count: usize,
    min_separation_km: f64,
) -> Reconciliation {
    let selections = normalize_selections(selections, target_count);

    let mut picked: Vec<(usize, AnnotatedPlace)> = Vec::with_capacity(target_count);
    let mut picked_ids = HashSet::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let Some(selection) = find_match(candidate.name(), &selections) else {
            continue;
        };
        if !picked_ids.insert(candidate.id()) {
            continue;
        }
        let reason = if selection.reason.trim().is_empty() {
            proximity_reason(candidate)
        } else {
            selection.reason.trim().to_string()
        };
        picked.push((index, candidate.clone().with_reason(reason)));
    }
    let matched = picked.len();

    if picked.len() < target_count {
        for (index, candidate) in candidates.iter().enumerate() {
            if picked.len() >= target_count {
                break;
            }
            if picked_ids.insert(candidate.id()) {
                picked.push((index, candidate.clone().with_reason(proximity_reason(candidate))));
            }
        }
    }

    if picked.len() < target_count {
        for (index, candidate) in candidates.iter().enumerate() {
            if picked.len() >= target_count {
                break;
            }
            if picked_ids.contains(&candidate.id()) {
                continue;
            }
            let kept = picked.iter().map(|(_, place)| place);
            if is_separated(candidate, kept, min_separation_km) {
                picked_ids.insert(candidate.id());
                picked.push((index, candidate.clone().with_reason(proximity_reason(candidate))));
            }
        }
    }

    picked.truncate(target_count);
    let matched = matched.min(picked.len());
    let backfilled = picked.len() - matched;
    picked.sort_by_key(|(index, _)| *index);

    Reconciliation {
        places: picked.into_iter().map(|(_, place)| place).collect(),
        matched,
        backfilled,
    }
}

/// Exact name first, then the recommender's name inside the place name, then
/// the place name inside the recommender's name.
fn find_match<'a>(place_name: &str, selections: &'a [Selection]) -> Option<&'a Selection> {
    if place_name.trim().is_empty() {
        return None;
    }

    selections
        .iter()
        .find(|selection| selection.place_name == place_name)
        .or_else(|| {
            selections
                .iter()
                .find(|selection| place_name.contains(selection.place_name.as_str()))
        })
        .or_else(|| {
            selections
                .iter()
                .find(|selection| selection.place_name.contains(place_name))
        })
}

/// Trims names, drops blank and repeated ones, and keeps at most
/// `target_count` picks.
fn normalize_selections(selections: &[Selection], target_count: usize) -> Vec<Selection> {
    let mut seen = HashSet::new();
    selections
        .iter()
        .map(|selection| Selection::new(selection.place_name.trim(), selection.reason.as_str()))
        .filter(|selection| !selection.place_name.is_empty())
        .filter(|selection| seen.insert(selection.place_name.clone()))
        .take(target_count)
        .collect()
}

fn proximity_reason(place: &AnnotatedPlace) -> String {
    format!(
        "Это место находится рядом с вами ({:.2} км) и может быть интересно для посещения.",
        place.distance_from_user
    )
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head = graphemes.by_ref().take(max_chars).collect::<String>();
    if graphemes.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
