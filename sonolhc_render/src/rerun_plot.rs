//! Rerun streaming of event scenes.
//!
//! Only available with the `visualization` feature. Each event lands under
//! `events/<id>/` with its own sequence index, so scrubbing the timeline in
//! the viewer steps through the event file.

use crate::canvas::{PlotScene, SceneItem};
use crate::error::RenderError;
use rerun::{Color, LineStrips3D, Points3D, Radius, RecordingStream, RecordingStreamBuilder};

/// Rerun logger for event scenes.
pub struct RerunPlotter {
    rec: RecordingStream,
    sequence: i64,
}

impl RerunPlotter {
    /// Creates a plotter that saves to an `.rrd` file.
    pub fn to_file(app_id: &str, path: &str) -> Result<Self, RenderError> {
        let rec = RecordingStreamBuilder::new(app_id)
            .save(path)
            .map_err(|e| RenderError::Rerun(e.to_string()))?;
        Ok(Self { rec, sequence: 0 })
    }

    /// Logs every item of one event scene.
    pub fn log_scene(&mut self, event_id: &str, scene: &PlotScene) -> Result<(), RenderError> {
        self.rec.set_time_sequence("event", self.sequence);
        self.sequence += 1;

        for (index, item) in scene.items.iter().enumerate() {
            match item {
                SceneItem::Track { segment, color, .. } => {
                    let (r, g, b) = color.rgb();
                    let strip = [
                        [segment.start.x as f32, segment.start.y as f32, segment.start.z as f32],
                        [segment.end.x as f32, segment.end.y as f32, segment.end.z as f32],
                    ];
                    self.rec
                        .log(
                            format!("events/{}/tracks/{}", event_id, index),
                            &LineStrips3D::new([strip]).with_colors([Color::from_rgb(r, g, b)]),
                        )
                        .map_err(|e| RenderError::Rerun(e.to_string()))?;
                }
                SceneItem::Cluster { center, radius } => {
                    self.rec
                        .log(
                            format!("events/{}/clusters/{}", event_id, index),
                            &Points3D::new([[center.x as f32, center.y as f32, center.z as f32]])
                                .with_colors([Color::from_rgb(0, 0, 0)])
                                .with_radii([Radius::new_scene_units(*radius as f32)]),
                        )
                        .map_err(|e| RenderError::Rerun(e.to_string()))?;
                }
            }
        }

        Ok(())
    }
}
