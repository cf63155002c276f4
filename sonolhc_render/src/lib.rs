//! SonoLHC Rendering Backends
//!
//! The event interpreter decides *what* to render; this crate decides *how*.
//! It defines the two collaborator seams and their default implementations:
//!
//! - [`AudioRenderer`]: profile + amplitude → sound clip ([`ToneSynth`], WAV via `hound`)
//! - [`PlotRenderer`]: 3D draw calls → [`PlotContext`] scene (PNG via `plotters`,
//!   JSON via `serde`, optional Rerun stream)
//!
//! # Example
//!
//! ```ignore
//! use sonolhc_render::{AudioRenderer, Profile, ToneSynth};
//!
//! let mut synth = ToneSynth::default();
//! let clip = synth.render(Profile::ClusterOnly, 0.4, false)?;
//! clip.write_wav("cluster.wav")?;
//! ```

mod audio;
mod error;
mod plot;
mod types;

pub mod canvas;
pub mod png;
pub mod synth;

#[cfg(feature = "visualization")]
pub mod rerun_plot;

pub use audio::AudioRenderer;
pub use canvas::{PlotColor, PlotContext, PlotScene, SceneItem};
pub use error::RenderError;
pub use plot::PlotRenderer;
pub use png::{write_png, PngConfig};
pub use synth::{SoundTrack, SynthConfig, ToneSynth};
pub use types::{Profile, TrackSegment};
