//! The "MATCHING" Engine - Track → Cluster → Companion association
//!
//! For one track, answers two questions:
//! 1. Does it point at a calorimeter cluster? (angular gate, default 0.07)
//! 2. Is there a later, oppositely charged track right next to it?
//!    (angular gate, default 0.04) If so the pair is a converted photon.
//!
//! The matcher never mutates the consumed ledger. Ids the caller must
//! record are returned in `MatchResult::ledger_updates`.
//!
//! Matching is directional: only tracks *after* the subject are scanned as
//! companions, so swapping two tracks in the input changes which one is the
//! primary of the pair.

use crate::sonolhc_event::{Cluster, EntityId, ParticleTrack};
use crate::sonolhc_profile::ConsumedLedger;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Angular gates for the matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// A track points at a cluster when their distance is below this (default: 0.07)
    pub cluster_radius: f64,

    /// Two tracks pair up when their distance is below this (default: 0.04)
    pub companion_radius: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cluster_radius: 0.07,
            companion_radius: 0.04,
        }
    }
}

// ============================================================================
// DISTANCE PREDICATES
// ============================================================================

/// Euclidean distance in (phi, theta) space.
#[inline]
pub fn angular_distance(phi_a: f64, theta_a: f64, phi_b: f64, theta_b: f64) -> f64 {
    ((phi_a - phi_b).powi(2) + (theta_a - theta_b).powi(2)).sqrt()
}

/// Whether `track` points at `cluster`. The gate is strict: a distance equal
/// to the radius is not a match.
pub fn points_at(track: &ParticleTrack, cluster: &Cluster, config: &MatchingConfig) -> bool {
    angular_distance(track.phi, track.theta, cluster.phi, cluster.theta) < config.cluster_radius
}

/// Whether `other` qualifies as the converted-photon partner of `track`.
pub fn is_companion(track: &ParticleTrack, other: &ParticleTrack, config: &MatchingConfig) -> bool {
    angular_distance(track.phi, track.theta, other.phi, other.theta) < config.companion_radius
        && track.charge != other.charge
}

// ============================================================================
// SEARCHES
// ============================================================================

/// All clusters `track` points at, in cluster order.
pub fn candidate_clusters<'a>(
    track: &ParticleTrack,
    clusters: &'a [Cluster],
    config: &MatchingConfig,
) -> Vec<&'a Cluster> {
    clusters
        .iter()
        .filter(|cluster| points_at(track, cluster, config))
        .collect()
}

/// First unconsumed track in `remaining` that pairs with `track`.
pub fn find_companion<'a>(
    track: &ParticleTrack,
    remaining: &'a [ParticleTrack],
    ledger: &ConsumedLedger,
    config: &MatchingConfig,
) -> Option<&'a ParticleTrack> {
    remaining
        .iter()
        .filter(|other| !ledger.contains_track(&other.id))
        .find(|other| is_companion(track, other, config))
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// Outcome of matching one track.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    /// Every cluster the track points at, in cluster order
    pub candidates: Vec<&'a Cluster>,

    /// Converted-photon partner, only searched when a cluster matched
    pub companion: Option<&'a ParticleTrack>,

    /// Ids to add to the ledger: the companion, then every candidate cluster
    pub ledger_updates: Vec<EntityId>,
}

impl<'a> MatchResult<'a> {
    /// The cluster used for classification. On ambiguity, the first in cluster order.
    pub fn matched_cluster(&self) -> Option<&'a Cluster> {
        self.candidates.first().copied()
    }

    /// More than one cluster matched. Physically a track should point at one at most.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    pub fn companion_id(&self) -> Option<&'a str> {
        self.companion.map(|t| t.id.as_str())
    }
}

/// Matches one track against the event.
///
/// `remaining` must hold only the tracks after `track` in event order.
pub fn match_track<'a>(
    track: &ParticleTrack,
    remaining: &'a [ParticleTrack],
    clusters: &'a [Cluster],
    ledger: &ConsumedLedger,
    config: &MatchingConfig,
) -> MatchResult<'a> {
    let candidates = candidate_clusters(track, clusters, config);

    let companion = if candidates.is_empty() {
        None
    } else {
        find_companion(track, remaining, ledger, config)
    };

    let ledger_updates = companion
        .map(ParticleTrack::entity_id)
        .into_iter()
        .chain(candidates.iter().map(|c| c.entity_id()))
        .collect();

    MatchResult {
        candidates,
        companion,
        ledger_updates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track(id: &str, charge: &str, phi: f64, theta: f64) -> ParticleTrack {
        ParticleTrack::new(id, charge, phi, theta)
    }

    fn cluster(id: &str, phi: f64, theta: f64) -> Cluster {
        Cluster::new(id, 40.0, phi, theta, 0.0)
    }

    #[test]
    fn test_angular_distance() {
        assert_relative_eq!(angular_distance(0.0, 0.0, 0.03, 0.04), 0.05, epsilon = 1e-12);
        assert_eq!(angular_distance(1.0, 2.0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_cluster_gate_boundary() {
        let config = MatchingConfig::default();
        let t = track("track1", "1", 0.0, 0.0);
        assert!(!points_at(&t, &cluster("cluster1", 0.07, 0.0), &config));
        assert!(points_at(&t, &cluster("cluster1", 0.069999, 0.0), &config));
        assert!(points_at(&t, &cluster("cluster1", 0.03, 0.04), &config));
    }

    #[test]
    fn test_companion_needs_opposite_charge() {
        let config = MatchingConfig::default();
        let t = track("track1", "1", 0.5, 1.0);
        assert!(is_companion(&t, &track("track2", "-1", 0.53, 1.0), &config));
        assert!(!is_companion(&t, &track("track2", "1", 0.53, 1.0), &config));
        assert!(!is_companion(&t, &track("track2", "-1", 0.54, 1.0), &config));
    }

    #[test]
    fn test_no_cluster_means_no_companion_search() {
        let config = MatchingConfig::default();
        let ledger = ConsumedLedger::new();
        let t = track("track1", "1", 0.5, 1.0);
        let rest = vec![track("track2", "-1", 0.51, 1.0)];
        let clusters = vec![cluster("cluster1", 2.0, 2.0)];

        let result = match_track(&t, &rest, &clusters, &ledger, &config);
        assert!(result.matched_cluster().is_none());
        assert!(result.companion.is_none());
        assert!(result.ledger_updates.is_empty());
    }

    #[test]
    fn test_first_companion_wins() {
        let config = MatchingConfig::default();
        let ledger = ConsumedLedger::new();
        let t = track("track1", "1", 0.5, 1.0);
        let rest = vec![
            track("track2", "1", 0.5, 1.0),
            track("track3", "-1", 0.52, 1.0),
            track("track4", "-1", 0.51, 1.0),
        ];
        let clusters = vec![cluster("cluster1", 0.5, 1.01)];

        let result = match_track(&t, &rest, &clusters, &ledger, &config);
        assert_eq!(result.companion_id(), Some("track3"));
        assert_eq!(
            result.ledger_updates,
            vec![EntityId::track("track3"), EntityId::cluster("cluster1")]
        );
    }

    #[test]
    fn test_consumed_track_is_not_a_companion() {
        let config = MatchingConfig::default();
        let mut ledger = ConsumedLedger::new();
        ledger.insert(EntityId::track("track2"));

        let t = track("track1", "1", 0.5, 1.0);
        let rest = vec![track("track2", "-1", 0.51, 1.0), track("track3", "-1", 0.52, 1.0)];
        let clusters = vec![cluster("cluster1", 0.5, 1.0)];

        let result = match_track(&t, &rest, &clusters, &ledger, &config);
        assert_eq!(result.companion_id(), Some("track3"));
    }

    #[test]
    fn test_multiple_clusters_take_first_in_order() {
        let config = MatchingConfig::default();
        let ledger = ConsumedLedger::new();
        let t = track("track1", "1", 0.5, 1.0);
        let clusters = vec![
            cluster("cluster9", 0.55, 1.0),
            cluster("cluster2", 0.5, 1.0),
        ];

        let result = match_track(&t, &[], &clusters, &ledger, &config);
        assert!(result.is_ambiguous());
        assert_eq!(result.matched_cluster().map(|c| c.id.as_str()), Some("cluster9"));
        assert_eq!(result.ledger_updates.len(), 2);
    }

    #[test]
    fn test_consumed_cluster_still_matches() {
        let config = MatchingConfig::default();
        let mut ledger = ConsumedLedger::new();
        ledger.insert(EntityId::cluster("cluster1"));

        let t = track("track5", "1", 0.5, 1.0);
        let clusters = vec![cluster("cluster1", 0.5, 1.0)];
        let result = match_track(&t, &[], &clusters, &ledger, &config);
        assert_eq!(result.matched_cluster().map(|c| c.id.as_str()), Some("cluster1"));
    }

    #[test]
    fn test_matching_is_directional() {
        let config = MatchingConfig::default();
        let ledger = ConsumedLedger::new();
        let a = track("trackA", "1", 0.5, 1.0);
        let b = track("trackB", "-1", 0.52, 1.0);
        let clusters = vec![cluster("cluster1", 0.5, 1.0)];

        // Earlier track sees the later one...
        let forward = match_track(&a, std::slice::from_ref(&b), &clusters, &ledger, &config);
        assert_eq!(forward.companion_id(), Some("trackB"));

        // ...but the last track has nobody left to scan.
        let backward = match_track(&b, &[], &clusters, &ledger, &config);
        assert!(backward.companion.is_none());
    }

    #[test]
    fn test_custom_gates() {
        let config = MatchingConfig {
            cluster_radius: 0.2,
            companion_radius: 0.1,
        };
        let t = track("track1", "1", 0.0, 0.0);
        assert!(points_at(&t, &cluster("cluster1", 0.15, 0.0), &config));
        assert!(is_companion(&t, &track("track2", "-1", 0.09, 0.0), &config));
    }
}
