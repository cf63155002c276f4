//! SonoLHC command-line driver
//!
//! Reads a HYPATIA event export, runs the event pass on every event and
//! writes one WAV and one PNG per event (optionally a scene JSON and a Rerun
//! recording).

pub mod config;
pub mod logging;
pub mod runner;

pub use config::AppConfig;
pub use runner::{artifact_name, EventReport, EventRunner, RunOptions, RunReport};
