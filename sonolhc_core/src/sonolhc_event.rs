//! The "EVENT" Model - one detector event as parsed from the HYPATIA export.
//!
//! Tracks and clusters are immutable once parsed. Their order inside an
//! event is semantically significant: it fixes the rendering order.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sonolhc_render::TrackSegment;
use std::fmt;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Raw charge column of a track.
///
/// Only compared for (in)equality when pairing converted-photon tracks, so
/// the token is kept verbatim instead of being interpreted as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargeMarker(pub String);

impl ChargeMarker {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Display for ChargeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of the consumed ledger.
///
/// Track and cluster ids live in separate namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Track(String),
    Cluster(String),
}

impl EntityId {
    pub fn track(id: impl Into<String>) -> Self {
        Self::Track(id.into())
    }

    pub fn cluster(id: impl Into<String>) -> Self {
        Self::Cluster(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Track(id) | EntityId::Cluster(id) => id,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TRACK
// ============================================================================

/// Simulation-truth code marking a muon track.
pub const TRUE_KIND_MUON: i32 = 1;

/// A reconstructed charged-particle trajectory through the inner detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleTrack {
    pub id: String,
    pub charge: ChargeMarker,

    /// Momentum p (GeV)
    pub momentum: f64,

    /// Transverse momentum pT (GeV)
    pub transverse_momentum: f64,

    pub phi: f64,
    pub theta: f64,
    pub eta: f64,
    pub cot_theta: f64,

    /// Simulation truth: 0 unknown, 1 muon, 2 electron, 3 electron cluster,
    /// 4 photon, 5 converted photon
    pub true_kind: i32,
    pub is_muon: bool,

    /// Not used by the interpreter
    pub interest_level: String,

    /// First hit (cm)
    pub entry: Vector3<f64>,

    /// Last hit (cm)
    pub exit: Vector3<f64>,

    /// Columns carried through without interpretation
    pub extra: Vec<String>,
}

impl ParticleTrack {
    /// Creates a track at the given angular position with zeroed kinematics.
    pub fn new(id: impl Into<String>, charge: impl Into<String>, phi: f64, theta: f64) -> Self {
        Self {
            id: id.into(),
            charge: ChargeMarker::new(charge),
            momentum: 0.0,
            transverse_momentum: 0.0,
            phi,
            theta,
            eta: 0.0,
            cot_theta: 0.0,
            true_kind: 0,
            is_muon: false,
            interest_level: String::from("0"),
            entry: Vector3::zeros(),
            exit: Vector3::zeros(),
            extra: Vec::new(),
        }
    }

    /// Sets the truth code (and with it `is_muon`).
    pub fn with_true_kind(mut self, true_kind: i32) -> Self {
        self.true_kind = true_kind;
        self.is_muon = true_kind == TRUE_KIND_MUON;
        self
    }

    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_hits(mut self, entry: Vector3<f64>, exit: Vector3<f64>) -> Self {
        self.entry = entry;
        self.exit = exit;
        self
    }

    /// The plotted segment between first and last hit.
    pub fn segment(&self) -> TrackSegment {
        TrackSegment::new(self.entry, self.exit)
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::track(self.id.as_str())
    }
}

// ============================================================================
// CLUSTER
// ============================================================================

/// A localized energy deposit in the electromagnetic calorimeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,

    /// Transverse energy (GeV)
    pub energy: f64,

    pub phi: f64,
    pub theta: f64,
    pub eta: f64,

    /// Columns carried through without interpretation
    pub extra: Vec<String>,
}

impl Cluster {
    pub fn new(id: impl Into<String>, energy: f64, phi: f64, theta: f64, eta: f64) -> Self {
        Self {
            id: id.into(),
            energy,
            phi,
            theta,
            eta,
            extra: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::cluster(self.id.as_str())
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// One unit of work: an event with its ordered tracks and clusters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub description: String,
    pub tracks: Vec<ParticleTrack>,
    pub clusters: Vec<Cluster>,
}

impl Event {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            tracks: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: ParticleTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Number of tracks plus clusters.
    pub fn entity_count(&self) -> usize {
        self.tracks.len() + self.clusters.len()
    }

    /// Every entity id in source order, tracks first.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.tracks
            .iter()
            .map(ParticleTrack::entity_id)
            .chain(self.clusters.iter().map(Cluster::entity_id))
    }
}
