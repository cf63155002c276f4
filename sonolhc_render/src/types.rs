//! Vocabulary shared between the event interpreter and the renderers.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbolic audio/visual archetype assigned to a track or cluster.
///
/// The renderer never sees the raw event, only one of these six names
/// plus an amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Muon track pointing at a calorimeter cluster
    MuonWithCluster,

    /// Non-muon track pointing at a cluster (electron-like)
    SingleTrackWithCluster,

    /// Two oppositely charged tracks sharing a cluster (converted photon)
    DoubleTrackWithCluster,

    /// Muon track with no cluster
    MuonOnly,

    /// Non-muon track with no cluster
    SingleTrackOnly,

    /// Cluster that no track pointed at
    ClusterOnly,
}

impl Profile {
    /// Returns all profiles in table order.
    pub fn all() -> [Profile; 6] {
        [
            Profile::MuonWithCluster,
            Profile::SingleTrackWithCluster,
            Profile::DoubleTrackWithCluster,
            Profile::MuonOnly,
            Profile::SingleTrackOnly,
            Profile::ClusterOnly,
        ]
    }

    /// Stable symbolic name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Profile::MuonWithCluster => "muon-with-cluster",
            Profile::SingleTrackWithCluster => "single-track-with-cluster",
            Profile::DoubleTrackWithCluster => "double-track-with-cluster",
            Profile::MuonOnly => "muon-only",
            Profile::SingleTrackOnly => "single-track-only",
            Profile::ClusterOnly => "cluster-only",
        }
    }

    /// Whether the rendered sound carries a cluster melody.
    pub fn has_cluster(&self) -> bool {
        matches!(
            self,
            Profile::MuonWithCluster
                | Profile::SingleTrackWithCluster
                | Profile::DoubleTrackWithCluster
                | Profile::ClusterOnly
        )
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::all()
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown profile: {}", s))
    }
}

/// Straight segment between the first and last inner-detector hit of a track (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
}

impl TrackSegment {
    pub fn new(start: Vector3<f64>, end: Vector3<f64>) -> Self {
        Self { start, end }
    }

    /// Returns the segment with its end point pushed out by `factor`.
    ///
    /// The start point is kept; only the exit coordinates are scaled.
    pub fn extended(&self, factor: f64) -> Self {
        Self {
            start: self.start,
            end: self.end * factor,
        }
    }
}
