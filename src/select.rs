// src/select.rs
//! Candidate selection: random, spread out in time, covering tracked people.

use std::collections::{BTreeMap, HashSet};

use chrono::Duration;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{FlashbackError, Result};
use crate::immich::Asset;

/// Search results grouped by window year.
pub type AssetPool = BTreeMap<i32, Vec<Asset>>;

/// Two accepted images must be at least this far apart.
pub const MIN_SPACING_SECS: i64 = 60;

/// Picks `limit` images from `pool`.
///
/// Draws a random year, then a random image of that year, and keeps it unless
/// it was taken within `MIN_SPACING_SECS` of an image already kept. Gives up
/// with `SelectionExhausted` after `max_attempts` draws. If a tracked person is
/// missing afterwards, one image of the first missing person is appended, so
/// the result holds `limit` or `limit + 1` images, shuffled.
pub fn select_candidates<R: Rng + ?Sized>(
    pool: &AssetPool,
    person_ids: &[String],
    limit: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<Asset>> {
    let years: Vec<&Vec<Asset>> = pool.values().filter(|v| !v.is_empty()).collect();
    if years.is_empty() {
        return Err(FlashbackError::EmptyCandidatePool);
    }

    let spacing = Duration::seconds(MIN_SPACING_SECS);
    let mut picked: Vec<Asset> = Vec::with_capacity(limit + 1);
    let mut attempts = 0usize;

    while picked.len() < limit {
        if attempts >= max_attempts {
            return Err(FlashbackError::SelectionExhausted {
                wanted: limit,
                found: picked.len(),
                attempts,
            });
        }
        attempts += 1;

        let Some(year) = years.choose(rng) else { break };
        let Some(asset) = year.choose(rng) else { continue };

        let too_close = picked
            .iter()
            .any(|p| (p.taken_at - asset.taken_at).abs() < spacing);
        if too_close {
            debug!(asset = %asset.id, "image too close to an accepted one, drawing again");
            continue;
        }
        picked.push(asset.clone());
    }

    if let Some(missing) = first_missing_person(&picked, person_ids) {
        let with_person: Vec<&Asset> = pool
            .values()
            .flatten()
            .filter(|a| a.has_person(missing))
            .collect();
        match with_person.choose(rng) {
            Some(extra) => {
                info!(person = %missing, asset = %extra.id, "tracked person missing, appending one image");
                picked.push((*extra).clone());
            }
            None => warn!(person = %missing, "tracked person has no images in any window"),
        }
    }

    picked.shuffle(rng);
    info!(count = picked.len(), attempts, "candidates selected");
    Ok(picked)
}

/// First id of `person_ids` that appears in none of `assets`.
pub fn first_missing_person<'a>(assets: &[Asset], person_ids: &'a [String]) -> Option<&'a str> {
    let seen: HashSet<&str> = assets
        .iter()
        .flat_map(|a| a.people.iter().map(|p| p.id.as_str()))
        .collect();
    person_ids
        .iter()
        .map(String::as_str)
        .find(|id| !seen.contains(id))
}
