//! SonoLHC Core - Event Interpretation for Particle-Collision Sonification
//!
//! Turns reconstructed detector events into an ordered sequence of rendered
//! entities (sound and plot):
//! 1. **Input**: HYPATIA text export → `Event` records (`sonolhc_io`)
//! 2. **Matching**: track → cluster and converted-photon companion (`sonolhc_matching`)
//! 3. **Selection**: match outcome → sonification profile, plus the consumed
//!    ledger that keeps every entity rendered exactly once (`sonolhc_profile`)
//! 4. **Pass**: the per-event state machine driving both renderers (`sonolhc_pass`)

pub mod sonolhc_event;
pub mod sonolhc_io;
pub mod sonolhc_matching;
pub mod sonolhc_pass;
pub mod sonolhc_profile;

// Re-export key types for convenience
pub use sonolhc_event::{ChargeMarker, Cluster, EntityId, Event, ParticleTrack};
pub use sonolhc_io::{parse_events, read_events, ParseError};
pub use sonolhc_matching::{match_track, MatchResult, MatchingConfig};
pub use sonolhc_pass::{
    plan_event, render_plan, sonify_event, EntitySummary, EventOutcome, EventPlan, EventSummary,
    PlannedEntity, SonifyConfig,
};
pub use sonolhc_profile::{select_profile, ConsumedLedger};
