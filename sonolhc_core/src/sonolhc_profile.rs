//! The "PROFILE" Selector - match outcome → sonification archetype
//!
//! | cluster | companion | muon | profile                   |
//! |---------|-----------|------|---------------------------|
//! | yes     | none      | yes  | muon-with-cluster         |
//! | yes     | none      | no   | single-track-with-cluster |
//! | yes     | present   | any  | double-track-with-cluster |
//! | none    | -         | yes  | muon-only                 |
//! | none    | -         | no   | single-track-only         |
//!
//! Clusters no track consumed are rendered as `cluster-only`.

use crate::sonolhc_event::EntityId;
use crate::sonolhc_matching::MatchResult;
use sonolhc_render::Profile;
use std::collections::HashSet;

/// Energy (GeV) mapped to amplitude 1.0.
pub const DEFAULT_ENERGY_SCALE: f64 = 100.0;

/// Picks the profile of one track. Pure function of the table above.
pub fn select_profile(result: &MatchResult<'_>, is_muon: bool) -> Profile {
    match (result.matched_cluster(), result.companion, is_muon) {
        (Some(_), Some(_), _) => Profile::DoubleTrackWithCluster,
        (Some(_), None, true) => Profile::MuonWithCluster,
        (Some(_), None, false) => Profile::SingleTrackWithCluster,
        (None, _, true) => Profile::MuonOnly,
        (None, _, false) => Profile::SingleTrackOnly,
    }
}

/// Cluster energy normalized for the renderers.
#[inline]
pub fn normalized_amplitude(energy: f64, energy_scale: f64) -> f64 {
    energy / energy_scale
}

// ============================================================================
// CONSUMED LEDGER
// ============================================================================

/// Ids already rendered during the current event pass.
///
/// Grows monotonically and is dropped with the pass; nothing carries over
/// between events. Insertion order is kept for reporting.
#[derive(Debug, Clone, Default)]
pub struct ConsumedLedger {
    seen: HashSet<EntityId>,
    order: Vec<EntityId>,
}

impl ConsumedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id`. Returns false if it was already present.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.seen.insert(id.clone()) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            self.insert(id);
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.seen.contains(id)
    }

    pub fn contains_track(&self, id: &str) -> bool {
        self.contains(&EntityId::track(id))
    }

    pub fn contains_cluster(&self, id: &str) -> bool {
        self.contains(&EntityId::cluster(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in the order they were consumed.
    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.order.iter()
    }
}
