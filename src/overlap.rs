//! Overlap regions: neighbouring sensors that may record one particle
//! crossing twice.
//!
//! [`overlap_map`] pairs every hit with the hits in overlapping sectors that
//! lie within a distance cut. [`expand_variants`] then materialises, for one
//! raw track, every alternative hit combination those pairs allow: for each
//! track hit with overlap partners the variant keeps the hit, adds a partner
//! next to it, or swaps the hit for the partner.

use crate::event::Event;
use crate::sectors::SectorSystem;
use crate::types::{Hit, HitId, RawTrack};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric hit → overlapping-hits relation. Hits without partners have no
/// entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlapMap {
    partners: BTreeMap<HitId, BTreeSet<HitId>>,
}

impl OverlapMap {
    pub fn get(&self, id: HitId) -> Option<&BTreeSet<HitId>> {
        self.partners.get(&id)
    }

    /// Hits with at least one partner.
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HitId, &BTreeSet<HitId>)> {
        self.partners.iter().map(|(id, set)| (*id, set))
    }
}

/// For every real hit, collects the real hits in overlapping sectors closer
/// than `max_distance` (mm).
pub fn overlap_map(event: &Event, sectors: &SectorSystem, max_distance: f64) -> OverlapMap {
    let mut partners: BTreeMap<HitId, BTreeSet<HitId>> = BTreeMap::new();
    for (sector, ids) in event.sectors() {
        let neighbours = sectors.overlapping_sectors(sector);
        for &id in ids {
            let hit = event.hit(id);
            if hit.is_virtual {
                continue;
            }
            for &other_sector in &neighbours {
                for &other in event.hits_in(other_sector) {
                    let candidate = event.hit(other);
                    if !candidate.is_virtual && hit.distance_to(candidate) <= max_distance {
                        partners.entry(id).or_default().insert(other);
                    }
                }
            }
        }
    }
    debug!(
        "overlap_map hits_with_partners={} max_distance={}",
        partners.len(),
        max_distance
    );
    OverlapMap { partners }
}

#[derive(Clone, Copy)]
enum Choice {
    Keep,
    Add(HitId),
    Swap(HitId),
}

/// All hit combinations of `track` reachable through `overlaps`, the
/// unchanged track first. Expansion stops at `max_variants` tracks.
pub fn expand_variants(
    track: &RawTrack,
    overlaps: &OverlapMap,
    event: &Event,
    max_variants: usize,
) -> Vec<RawTrack> {
    let cap = max_variants.max(1);
    let options: Vec<Vec<Choice>> = track
        .hits
        .iter()
        .map(|hit| {
            let mut choices = vec![Choice::Keep];
            if let Some(partners) = overlaps.get(hit.id) {
                for &partner in partners.iter().filter(|&&p| !track.contains(p)) {
                    choices.push(Choice::Add(partner));
                    choices.push(Choice::Swap(partner));
                }
            }
            choices
        })
        .collect();

    let total = options
        .iter()
        .try_fold(1usize, |acc, o| acc.checked_mul(o.len()))
        .unwrap_or(usize::MAX);
    if total > cap {
        warn!(
            "expand_variants: {} combinations for a {}-hit track, keeping {}",
            total,
            track.len(),
            cap
        );
    }

    let mut variants = Vec::with_capacity(total.min(cap));
    let mut index = vec![0usize; options.len()];
    loop {
        let variant = assemble(track, &options, &index, event);
        if variant_is_consistent(&variant) {
            variants.push(variant);
        }
        if variants.len() >= cap || !advance(&mut index, &options) {
            break;
        }
    }
    variants
}

/// Odometer step over the per-hit choices; false once every combination was
/// visited.
fn advance(index: &mut [usize], options: &[Vec<Choice>]) -> bool {
    for (slot, choices) in index.iter_mut().zip(options) {
        *slot += 1;
        if *slot < choices.len() {
            return true;
        }
        *slot = 0;
    }
    false
}

fn assemble(track: &RawTrack, options: &[Vec<Choice>], index: &[usize], event: &Event) -> RawTrack {
    let mut hits: Vec<Hit> = Vec::with_capacity(track.len() + 1);
    for ((hit, choices), &i) in track.hits.iter().zip(options).zip(index) {
        match choices[i] {
            Choice::Keep => hits.push(*hit),
            Choice::Swap(partner) => hits.push(*event.hit(partner)),
            Choice::Add(partner) => {
                let partner = *event.hit(partner);
                if partner.z().abs() < hit.z().abs() {
                    hits.push(partner);
                    hits.push(*hit);
                } else {
                    hits.push(*hit);
                    hits.push(partner);
                }
            }
        }
    }
    RawTrack::new(hits)
}

/// Two track hits may share a partner; such combinations would repeat a
/// hit.
fn variant_is_consistent(track: &RawTrack) -> bool {
    let mut seen = BTreeSet::new();
    track.hit_ids().all(|id| seen.insert(id))
}
