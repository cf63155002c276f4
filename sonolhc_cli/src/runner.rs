//! Event runner - drives the event pass over a whole input file.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use sonolhc_core::{read_events, sonify_event, Event, EventSummary};
use sonolhc_render::{write_png, PlotContext, ToneSynth};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(feature = "visualization")]
use sonolhc_render::rerun_plot::RerunPlotter;

/// Which artifacts to write, and where.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory receiving every artifact (default: `sonolhc-outputs`)
    pub output_dir: PathBuf,

    /// Write `plot-dataset-<id>.png` (default: true)
    pub plot: bool,

    /// Write `sound-dataset-<id>.wav` (default: true)
    pub audio: bool,

    /// Write `scene-dataset-<id>.json` (default: false)
    pub scene_json: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("sonolhc-outputs"),
            plot: true,
            audio: true,
            scene_json: false,
        }
    }
}

/// Outcome of one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    #[serde(flatten)]
    pub summary: EventSummary,

    /// Length of the rendered sound in seconds
    pub audio_seconds: f64,

    /// Files written for this event
    pub artifacts: Vec<PathBuf>,
}

/// Outcome of a whole input file.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub events: Vec<EventReport>,
}

impl RunReport {
    pub fn anomalies(&self) -> usize {
        self.events.iter().map(|e| e.summary.anomalies).sum()
    }

    pub fn entity_count(&self) -> usize {
        self.events.iter().map(|e| e.summary.entities.len()).sum()
    }
}

/// Replaces characters unsafe in file names by `_`.
fn sanitize_id(event_id: &str) -> String {
    event_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name of one artifact. Characters unsafe in file names are replaced by `_`.
pub fn artifact_name(prefix: &str, event_id: &str, extension: &str) -> String {
    format!("{}-{}.{}", prefix, sanitize_id(event_id), extension)
}

/// Runs events one after the other. Nothing is shared between events
/// except the synthesizer settings and the optional Rerun stream.
pub struct EventRunner {
    config: AppConfig,
    options: RunOptions,
    synth: ToneSynth,

    /// Artifact stems already written by this runner
    issued: HashSet<String>,

    #[cfg(feature = "visualization")]
    rerun: Option<RerunPlotter>,
}

impl EventRunner {
    pub fn new(config: AppConfig, options: RunOptions) -> Self {
        let synth = ToneSynth::new(config.synth.clone());
        Self {
            config,
            options,
            synth,
            issued: HashSet::new(),
            #[cfg(feature = "visualization")]
            rerun: None,
        }
    }

    /// Also streams every event scene to Rerun.
    #[cfg(feature = "visualization")]
    pub fn with_rerun(mut self, plotter: RerunPlotter) -> Self {
        self.rerun = Some(plotter);
        self
    }

    /// Parses `input` and renders every event in file order.
    pub fn run_file(&mut self, input: &Path) -> Result<RunReport> {
        let events = read_events(input)
            .with_context(|| format!("Failed to parse {}", input.display()))?;
        info!("Loaded {} events from {}", events.len(), input.display());

        if self.options.plot || self.options.audio || self.options.scene_json {
            std::fs::create_dir_all(&self.options.output_dir).with_context(|| {
                format!("Failed to create {}", self.options.output_dir.display())
            })?;
        }

        let mut reports = Vec::with_capacity(events.len());
        for event in &events {
            reports.push(self.run_event(event)?);
        }

        Ok(RunReport {
            input: input.to_path_buf(),
            events: reports,
        })
    }

    /// File-name stem for an event, unique among the stems this runner issued.
    ///
    /// Distinct ids can sanitize to the same stem (`event/002`, `event:002`).
    /// Later events then get a `-2`, `-3`, ... suffix instead of overwriting.
    fn artifact_stem(&mut self, event_id: &str) -> String {
        let base = sanitize_id(event_id);
        if self.issued.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.issued.insert(candidate.clone()) {
                warn!(
                    "Event id {:?} collides with an earlier event; writing its files as {}",
                    event_id, candidate
                );
                return candidate;
            }
            n += 1;
        }
    }

    /// Renders one event and writes its artifacts.
    pub fn run_event(&mut self, event: &Event) -> Result<EventReport> {
        let mut plot = PlotContext::new(event.id.clone());
        let outcome = sonify_event(event, &self.config.sonify, &mut self.synth, &mut plot)
            .with_context(|| format!("Failed to render event {}", event.id))?;
        let scene = plot.into_scene();
        let stem = self.artifact_stem(&event.id);
        let dir = &self.options.output_dir;
        let mut artifacts = Vec::new();

        if self.options.audio {
            let path = dir.join(artifact_name("sound-dataset", &stem, "wav"));
            outcome
                .sound
                .write_wav(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {}", path.display());
            artifacts.push(path);
        }

        if self.options.plot {
            let path = dir.join(artifact_name("plot-dataset", &stem, "png"));
            write_png(&scene, &path, &self.config.png)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {}", path.display());
            artifacts.push(path);
        }

        if self.options.scene_json {
            let path = dir.join(artifact_name("scene-dataset", &stem, "json"));
            scene
                .write_json(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {}", path.display());
            artifacts.push(path);
        }

        #[cfg(feature = "visualization")]
        if let Some(rerun) = self.rerun.as_mut() {
            rerun
                .log_scene(&event.id, &scene)
                .with_context(|| format!("Failed to stream event {}", event.id))?;
        }

        info!(
            "✓ {} rendered: {} entities, {:.1}s of audio",
            event.id,
            outcome.summary.entities.len(),
            outcome.sound.duration()
        );

        Ok(EventReport {
            audio_seconds: outcome.sound.duration(),
            summary: outcome.summary,
            artifacts,
        })
    }
}
