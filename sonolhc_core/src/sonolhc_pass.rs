//! The event pass - one event from records to rendered artifacts.
//!
//! State machine per event:
//! 1. **Tracks**: for each track not yet consumed, match → classify → mark
//!    consumed (the track itself, its companion, its candidate clusters).
//! 2. **Clusters**: every cluster still unconsumed becomes `cluster-only`.
//!
//! The pass starts with an empty ledger and ends with every track and
//! cluster id in it exactly once. Planning (`plan_event`) is pure; rendering
//! (`render_plan`) replays the plan against the two backends in plan order.

use crate::sonolhc_event::{Cluster, EntityId, Event, ParticleTrack};
use crate::sonolhc_matching::{match_track, MatchingConfig};
use crate::sonolhc_profile::{normalized_amplitude, select_profile, ConsumedLedger, DEFAULT_ENERGY_SCALE};
use serde::{Deserialize, Serialize};
use sonolhc_render::{AudioRenderer, PlotRenderer, Profile, RenderError};
use tracing::{debug, info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for one event pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SonifyConfig {
    /// Angular gates
    pub matching: MatchingConfig,

    /// Cluster energy (GeV) that maps to amplitude 1.0 (default: 100)
    pub energy_scale: f64,

    /// Silence after each rendered entity (default: 1 s)
    pub seconds_between_entities: f64,
}

impl Default for SonifyConfig {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            energy_scale: DEFAULT_ENERGY_SCALE,
            seconds_between_entities: 1.0,
        }
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// One rendered unit: a track (maybe with companion and cluster) or a lone cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEntity<'a> {
    pub profile: Profile,

    /// Primary track, `None` for `cluster-only`
    pub track: Option<&'a ParticleTrack>,

    /// Converted-photon partner
    pub companion: Option<&'a ParticleTrack>,

    /// Candidate clusters in cluster order. The first is the one sonified.
    pub clusters: Vec<&'a Cluster>,

    /// Normalized energy of the sonified cluster (0 without a cluster)
    pub amplitude: f64,
}

impl<'a> PlannedEntity<'a> {
    pub fn cluster(&self) -> Option<&'a Cluster> {
        self.clusters.first().copied()
    }

    /// Ids of everything this entry renders, primary first.
    pub fn entity_names(&self) -> Vec<&'a str> {
        self.track
            .into_iter()
            .chain(self.companion)
            .map(|t| t.id.as_str())
            .chain(self.cluster().map(|c| c.id.as_str()))
            .collect()
    }

    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            profile: self.profile,
            track_id: self.track.map(|t| t.id.clone()),
            companion_id: self.companion.map(|t| t.id.clone()),
            cluster_id: self.cluster().map(|c| c.id.clone()),
            ignored_clusters: self.clusters.iter().skip(1).map(|c| c.id.clone()).collect(),
            amplitude: self.amplitude,
        }
    }
}

/// Ordered render plan of one event plus the final ledger.
#[derive(Debug, Clone)]
pub struct EventPlan<'a> {
    pub event: &'a Event,
    pub entries: Vec<PlannedEntity<'a>>,
    pub ledger: ConsumedLedger,

    /// Tracks that pointed at more than one cluster
    pub anomalies: usize,
}

impl<'a> EventPlan<'a> {
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event_id: self.event.id.clone(),
            description: self.event.description.clone(),
            entities: self.entries.iter().map(PlannedEntity::summary).collect(),
            anomalies: self.anomalies,
            consumed: self.ledger.iter().cloned().collect(),
        }
    }
}

/// Serializable record of one rendered entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_clusters: Vec<String>,
    pub amplitude: f64,
}

/// Serializable record of one event pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    pub description: String,
    pub entities: Vec<EntitySummary>,
    pub anomalies: usize,

    /// Ids in the order the pass consumed them
    pub consumed: Vec<EntityId>,
}

/// Builds the render plan of one event.
pub fn plan_event<'a>(event: &'a Event, config: &SonifyConfig) -> EventPlan<'a> {
    info!(
        "Event {} ({} tracks, {} clusters)",
        event.id,
        event.tracks.len(),
        event.clusters.len()
    );

    let mut ledger = ConsumedLedger::new();
    let mut entries = Vec::new();
    let mut anomalies = 0;

    // Phase 1: tracks
    for (index, track) in event.tracks.iter().enumerate() {
        if ledger.contains_track(&track.id) {
            debug!("Skipping {} (already rendered as a companion)", track.id);
            continue;
        }

        let remaining = &event.tracks[index + 1..];
        let result = match_track(track, remaining, &event.clusters, &ledger, &config.matching);

        if result.is_ambiguous() {
            anomalies += 1;
            let ids: Vec<&str> = result.candidates.iter().map(|c| c.id.as_str()).collect();
            warn!(
                "Track {} points at more than one cluster ({}); using {}",
                track.id,
                ids.join(", "),
                ids[0]
            );
        }

        let profile = select_profile(&result, track.is_muon);
        let amplitude = result
            .matched_cluster()
            .map(|c| normalized_amplitude(c.energy, config.energy_scale))
            .unwrap_or(0.0);

        ledger.extend(result.ledger_updates.iter().cloned());
        ledger.insert(track.entity_id());

        entries.push(PlannedEntity {
            profile,
            track: Some(track),
            companion: result.companion,
            clusters: result.candidates,
            amplitude,
        });
    }

    // Phase 2: clusters nobody pointed at
    for cluster in &event.clusters {
        if ledger.insert(cluster.entity_id()) {
            entries.push(PlannedEntity {
                profile: Profile::ClusterOnly,
                track: None,
                companion: None,
                clusters: vec![cluster],
                amplitude: normalized_amplitude(cluster.energy, config.energy_scale),
            });
        }
    }

    for entry in &entries {
        info!("Sonifying {} as {}", entry.entity_names().join(", "), entry.profile);
    }

    EventPlan {
        event,
        entries,
        ledger,
        anomalies,
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Replays a plan against the audio and plot backends.
///
/// Returns the event's concatenated audio, one clip per entry, each followed
/// by `seconds_between_entities` of silence.
pub fn render_plan<A, P>(
    plan: &EventPlan<'_>,
    config: &SonifyConfig,
    audio: &mut A,
    plot: &mut P,
) -> Result<A::Clip, RenderError>
where
    A: AudioRenderer,
    P: PlotRenderer,
{
    let mut sound = audio.empty();

    for entry in &plan.entries {
        match entry.track {
            Some(track) => {
                plot.draw_track(&track.segment(), track.is_muon)?;
                // Matched deposits are drawn where the track points
                for cluster in &entry.clusters {
                    plot.draw_cluster(
                        track.phi,
                        track.theta,
                        track.eta,
                        normalized_amplitude(cluster.energy, config.energy_scale),
                    )?;
                }
                if let Some(companion) = entry.companion {
                    plot.draw_track(&companion.segment(), false)?;
                }
            }
            None => {
                if let Some(cluster) = entry.cluster() {
                    plot.draw_cluster(cluster.phi, cluster.theta, cluster.eta, entry.amplitude)?;
                }
            }
        }

        let clip = audio.render(entry.profile, entry.amplitude, entry.companion.is_some())?;
        audio.append(&mut sound, &clip, config.seconds_between_entities);
    }

    Ok(sound)
}

/// Result of a full event pass.
#[derive(Debug, Clone)]
pub struct EventOutcome<C> {
    pub sound: C,
    pub summary: EventSummary,
}

/// Plans and renders one event.
pub fn sonify_event<A, P>(
    event: &Event,
    config: &SonifyConfig,
    audio: &mut A,
    plot: &mut P,
) -> Result<EventOutcome<A::Clip>, RenderError>
where
    A: AudioRenderer,
    P: PlotRenderer,
{
    let plan = plan_event(event, config);
    let sound = render_plan(&plan, config, audio, plot)?;
    Ok(EventOutcome {
        sound,
        summary: plan.summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sonolhc_event::EntityId;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use sonolhc_render::{PlotContext, SceneItem, TrackSegment};

    // ------------------------------------------------------------------------
    // Recording backends
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingAudio {
        gaps: Vec<f64>,
    }

    impl AudioRenderer for RecordingAudio {
        type Clip = Vec<(Profile, f64, bool)>;

        fn empty(&self) -> Self::Clip {
            Vec::new()
        }

        fn render(
            &mut self,
            profile: Profile,
            amplitude: f64,
            companion_present: bool,
        ) -> Result<Self::Clip, RenderError> {
            Ok(vec![(profile, amplitude, companion_present)])
        }

        fn append(&mut self, into: &mut Self::Clip, clip: &Self::Clip, gap_seconds: f64) {
            into.extend(clip.iter().copied());
            self.gaps.push(gap_seconds);
        }
    }

    #[derive(Default)]
    struct RecordingPlot {
        calls: Vec<String>,
    }

    impl PlotRenderer for RecordingPlot {
        fn draw_track(&mut self, _segment: &TrackSegment, is_muon: bool) -> Result<(), RenderError> {
            self.calls.push(if is_muon { "muon" } else { "track" }.to_string());
            Ok(())
        }

        fn draw_cluster(
            &mut self,
            phi: f64,
            _theta: f64,
            _eta: f64,
            amplitude: f64,
        ) -> Result<(), RenderError> {
            self.calls.push(format!("cluster@{:.2}x{:.2}", phi, amplitude));
            Ok(())
        }
    }

    fn track(id: &str, charge: &str, phi: f64, theta: f64) -> ParticleTrack {
        ParticleTrack::new(id, charge, phi, theta)
    }

    fn profiles(plan: &EventPlan<'_>) -> Vec<Profile> {
        plan.entries.iter().map(|e| e.profile).collect()
    }

    // ------------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------------

    #[test]
    fn test_lone_muon_is_muon_only() {
        let event = Event::new("e1", "")
            .with_track(track("track1", "1", 0.5, 1.0).with_true_kind(1))
            .with_cluster(Cluster::new("cluster1", 30.0, 2.0, 2.0, 0.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(profiles(&plan), vec![Profile::MuonOnly, Profile::ClusterOnly]);
        assert_eq!(plan.entries[0].amplitude, 0.0);
    }

    #[test]
    fn test_electron_with_cluster_amplitude() {
        let event = Event::new("e2", "")
            .with_track(track("track1", "1", 0.50, 1.0))
            .with_cluster(Cluster::new("cluster1", 40.0, 0.53, 1.04, 0.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(profiles(&plan), vec![Profile::SingleTrackWithCluster]);
        assert_relative_eq!(plan.entries[0].amplitude, 0.4, epsilon = 1e-12);
        assert_eq!(plan.entries[0].cluster().map(|c| c.id.as_str()), Some("cluster1"));
    }

    #[test]
    fn test_converted_photon_renders_once() {
        let event = Event::new("e3", "")
            .with_track(track("track1", "1", 0.50, 1.0))
            .with_track(track("track2", "-1", 0.53, 1.0))
            .with_cluster(Cluster::new("cluster1", 25.0, 0.51, 1.0, 0.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(profiles(&plan), vec![Profile::DoubleTrackWithCluster]);
        let entry = &plan.entries[0];
        assert_eq!(entry.track.map(|t| t.id.as_str()), Some("track1"));
        assert_eq!(entry.companion.map(|t| t.id.as_str()), Some("track2"));
        assert!(plan.ledger.contains_track("track2"));
        assert_eq!(plan.ledger.len(), 3);
    }

    #[test]
    fn test_unmatched_cluster_renders_after_tracks() {
        let event = Event::new("e4", "")
            .with_cluster(Cluster::new("cluster1", 12.0, 2.0, 0.5, 0.0))
            .with_track(track("track1", "1", 0.5, 1.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(profiles(&plan), vec![Profile::SingleTrackOnly, Profile::ClusterOnly]);
        assert_relative_eq!(plan.entries[1].amplitude, 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_two_cluster_match_uses_first() {
        let event = Event::new("e5", "")
            .with_track(track("track1", "1", 0.5, 1.0))
            .with_cluster(Cluster::new("cluster1", 10.0, 0.52, 1.0, 0.0))
            .with_cluster(Cluster::new("cluster2", 90.0, 0.49, 1.0, 0.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(plan.anomalies, 1);
        assert_eq!(profiles(&plan), vec![Profile::SingleTrackWithCluster]);
        assert_relative_eq!(plan.entries[0].amplitude, 0.1, epsilon = 1e-12);
        let summary = plan.entries[0].summary();
        assert_eq!(summary.cluster_id.as_deref(), Some("cluster1"));
        assert_eq!(summary.ignored_clusters, vec!["cluster2".to_string()]);
        // The second candidate is consumed, not re-rendered as cluster-only
        assert!(plan.ledger.contains_cluster("cluster2"));
    }

    #[test]
    fn test_swapping_pair_changes_primary() {
        let a = track("trackA", "1", 0.50, 1.0);
        let b = track("trackB", "-1", 0.52, 1.0);
        let c = Cluster::new("cluster1", 20.0, 0.5, 1.0, 0.0);

        let forward = Event::new("f", "").with_track(a.clone()).with_track(b.clone()).with_cluster(c.clone());
        let backward = Event::new("b", "").with_track(b).with_track(a).with_cluster(c);

        let f = plan_event(&forward, &SonifyConfig::default());
        let r = plan_event(&backward, &SonifyConfig::default());
        assert_eq!(f.entries[0].track.map(|t| t.id.as_str()), Some("trackA"));
        assert_eq!(r.entries[0].track.map(|t| t.id.as_str()), Some("trackB"));
    }

    #[test]
    fn test_shared_cluster_matches_both_tracks() {
        // Same charge: no pairing, both tracks keep the cluster
        let event = Event::new("e6", "")
            .with_track(track("track1", "1", 0.50, 1.0))
            .with_track(track("track2", "1", 0.52, 1.0))
            .with_cluster(Cluster::new("cluster1", 50.0, 0.51, 1.0, 0.0));
        let plan = plan_event(&event, &SonifyConfig::default());

        assert_eq!(
            profiles(&plan),
            vec![Profile::SingleTrackWithCluster, Profile::SingleTrackWithCluster]
        );
        assert_eq!(plan.ledger.len(), 3);
    }

    #[test]
    fn test_empty_event() {
        let event = Event::new("empty", "");
        let plan = plan_event(&event, &SonifyConfig::default());
        assert!(plan.entries.is_empty());
        assert!(plan.ledger.is_empty());
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    #[test]
    fn test_render_order_and_gaps() {
        let event = Event::new("e7", "")
            .with_track(track("track1", "1", 0.50, 1.0).with_true_kind(1))
            .with_track(track("track2", "1", 0.51, 1.0))
            .with_track(track("track3", "-1", 0.52, 1.0))
            .with_cluster(Cluster::new("cluster1", 40.0, 3.0, 0.2, 0.0))
            .with_cluster(Cluster::new("cluster2", 60.0, 0.5, 1.0, 0.0));
        let config = SonifyConfig::default();
        let mut audio = RecordingAudio::default();
        let mut plot = RecordingPlot::default();

        let outcome = sonify_event(&event, &config, &mut audio, &mut plot).unwrap();

        // track1 pairs with track3 (track2 has the same charge), track2 still
        // sees cluster2 on its own, and cluster1 is left over.
        assert_eq!(
            outcome.sound,
            vec![
                (Profile::DoubleTrackWithCluster, 0.6, true),
                (Profile::SingleTrackWithCluster, 0.6, false),
                (Profile::ClusterOnly, 0.4, false),
            ]
        );
        assert_eq!(audio.gaps, vec![1.0, 1.0, 1.0]);
        assert_eq!(
            plot.calls,
            vec![
                "muon",
                "cluster@0.50x0.60",
                "track",
                "track",
                "cluster@0.51x0.60",
                "cluster@3.00x0.40",
            ]
        );
        assert_eq!(
            outcome.summary.consumed,
            vec![
                EntityId::track("track3"),
                EntityId::cluster("cluster2"),
                EntityId::track("track1"),
                EntityId::track("track2"),
                EntityId::cluster("cluster1"),
            ]
        );
        assert_eq!(outcome.summary.entities.len(), 3);
    }

    #[test]
    fn test_render_into_plot_context() {
        let event = Event::new("e8", "")
            .with_track(track("track1", "1", 0.5, 1.0))
            .with_cluster(Cluster::new("cluster1", 40.0, 2.5, 1.0, 0.3));
        let config = SonifyConfig::default();
        let mut audio = RecordingAudio::default();
        let mut ctx = PlotContext::new(event.id.clone());

        sonify_event(&event, &config, &mut audio, &mut ctx).unwrap();

        let scene = ctx.into_scene();
        assert_eq!(scene.track_count(), 1);
        assert_eq!(scene.cluster_count(), 1);
        assert!(matches!(scene.items[1], SceneItem::Cluster { radius, .. } if (radius - 6.0).abs() < 1e-9));
    }

    #[test]
    fn test_summary_serializes() {
        let event = Event::new("e9", "desc")
            .with_track(track("track1", "1", 0.5, 1.0).with_true_kind(1));
        let summary = plan_event(&event, &SonifyConfig::default()).summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["event_id"], "e9");
        assert_eq!(json["entities"][0]["profile"], "muon-only");
        assert!(json["entities"][0].get("cluster_id").is_none());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SonifyConfig =
            serde_json::from_str(r#"{ "matching": { "cluster_radius": 0.1 } }"#).unwrap();
        assert_relative_eq!(config.matching.cluster_radius, 0.1);
        assert_relative_eq!(config.matching.companion_radius, 0.04);
        assert_relative_eq!(config.energy_scale, 100.0);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn build_event(
        tracks: &[(f64, f64, bool, bool)],
        clusters: &[(f64, f64, f64)],
    ) -> Event {
        let mut event = Event::new("prop", "");
        for (i, &(phi, theta, positive, muon)) in tracks.iter().enumerate() {
            let charge = if positive { "1" } else { "-1" };
            let kind = if muon { 1 } else { 2 };
            event.tracks.push(track(&format!("track{}", i), charge, phi, theta).with_true_kind(kind));
        }
        for (i, &(phi, theta, energy)) in clusters.iter().enumerate() {
            event.clusters.push(Cluster::new(format!("cluster{}", i), energy, phi, theta, 0.0));
        }
        event
    }

    proptest! {
        #[test]
        fn prop_every_entity_consumed_exactly_once(
            tracks in prop::collection::vec((0.0f64..0.3, 0.0f64..0.3, any::<bool>(), any::<bool>()), 0..10),
            clusters in prop::collection::vec((0.0f64..0.3, 0.0f64..0.3, 0.0f64..200.0), 0..6),
        ) {
            let event = build_event(&tracks, &clusters);
            let plan = plan_event(&event, &SonifyConfig::default());

            prop_assert_eq!(plan.ledger.len(), event.entity_count());
            for id in event.entity_ids() {
                prop_assert!(plan.ledger.contains(&id));
            }

            // Every track is rendered once, either as primary or as companion
            let mut rendered: Vec<&str> = plan
                .entries
                .iter()
                .flat_map(|e| e.track.into_iter().chain(e.companion))
                .map(|t| t.id.as_str())
                .collect();
            rendered.sort_unstable();
            let mut expected: Vec<&str> = event.tracks.iter().map(|t| t.id.as_str()).collect();
            expected.sort_unstable();
            prop_assert_eq!(rendered, expected);

            // Cluster-only entries only for clusters no track pointed at
            for entry in plan.entries.iter().filter(|e| e.profile == Profile::ClusterOnly) {
                let cluster = entry.cluster().unwrap();
                prop_assert!(!plan.entries.iter().any(|e| e.track.is_some()
                    && e.clusters.iter().any(|c| c.id == cluster.id)));
            }
        }

        #[test]
        fn prop_render_order_follows_event_order(
            tracks in prop::collection::vec((0.0f64..0.3, 0.0f64..0.3, any::<bool>(), any::<bool>()), 0..10),
            clusters in prop::collection::vec((0.0f64..0.3, 0.0f64..0.3, 0.0f64..200.0), 0..6),
        ) {
            let event = build_event(&tracks, &clusters);
            let plan = plan_event(&event, &SonifyConfig::default());

            let position = |id: &EntityId| event.entity_ids().position(|e| &e == id).unwrap();
            let primaries: Vec<usize> = plan
                .entries
                .iter()
                .map(|e| match (e.track, e.cluster()) {
                    (Some(t), _) => position(&t.entity_id()),
                    (None, Some(c)) => position(&c.entity_id()),
                    (None, None) => unreachable!(),
                })
                .collect();
            prop_assert!(primaries.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
