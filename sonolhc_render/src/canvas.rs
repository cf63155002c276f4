//! Per-event plot context.
//!
//! `PlotContext` implements `PlotRenderer` by recording resolved 3D geometry
//! into a `PlotScene`. The scene can then be exported as PNG (`crate::png`),
//! JSON, or streamed to Rerun. Nothing here is global: each event gets a
//! fresh context and therefore restarts the color cycle.

use crate::error::RenderError;
use crate::plot::PlotRenderer;
use crate::types::TrackSegment;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Muons pass every detector layer; their drawn segment is stretched by this factor.
pub const MUON_EXTENSION: f64 = 3.0;

/// Calorimeter shell radius (cm) for the barrel (|eta| < 1.5) and the end-caps.
pub const BARREL_RADIUS: f64 = 150.0;
pub const ENDCAP_RADIUS: f64 = 210.0;
pub const BARREL_ETA_LIMIT: f64 = 1.5;

/// Track colors, cycled per draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotColor {
    Blue,
    Orange,
    Green,
    Red,
    Purple,
    Brown,
    Pink,
    Grey,
    Olive,
    Cyan,
}

pub const PALETTE: [PlotColor; 10] = [
    PlotColor::Blue,
    PlotColor::Orange,
    PlotColor::Green,
    PlotColor::Red,
    PlotColor::Purple,
    PlotColor::Brown,
    PlotColor::Pink,
    PlotColor::Grey,
    PlotColor::Olive,
    PlotColor::Cyan,
];

impl PlotColor {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            PlotColor::Blue => (0, 0, 255),
            PlotColor::Orange => (255, 165, 0),
            PlotColor::Green => (0, 128, 0),
            PlotColor::Red => (255, 0, 0),
            PlotColor::Purple => (128, 0, 128),
            PlotColor::Brown => (165, 42, 42),
            PlotColor::Pink => (255, 192, 203),
            PlotColor::Grey => (128, 128, 128),
            PlotColor::Olive => (128, 128, 0),
            PlotColor::Cyan => (0, 255, 255),
        }
    }
}

/// Color of the `draw_index`-th track draw of an event.
pub fn color_for_draw(draw_index: usize) -> PlotColor {
    PALETTE[draw_index % PALETTE.len()]
}

/// Converts a cluster's angular position to its sphere center on the calorimeter shell.
pub fn cluster_center(phi: f64, theta: f64, eta: f64) -> Vector3<f64> {
    let r = if eta.abs() < BARREL_ETA_LIMIT {
        BARREL_RADIUS
    } else {
        ENDCAP_RADIUS
    };
    Vector3::new(
        r * theta.sin() * phi.cos(),
        r * theta.sin() * phi.sin(),
        r * theta.cos(),
    )
}

/// Sphere radius for a normalized cluster amplitude.
pub fn cluster_radius(amplitude: f64) -> f64 {
    amplitude * 10.0 + 2.0
}

/// A resolved draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneItem {
    Track {
        segment: TrackSegment,
        color: PlotColor,
        muon: bool,
    },
    Cluster {
        center: Vector3<f64>,
        radius: f64,
    },
}

/// All draws of one event, in draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotScene {
    pub title: String,
    pub items: Vec<SceneItem>,
}

impl PlotScene {
    pub fn track_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, SceneItem::Track { .. }))
            .count()
    }

    pub fn cluster_count(&self) -> usize {
        self.items.len() - self.track_count()
    }

    /// Writes the scene as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Render context for one event.
#[derive(Debug, Clone, Default)]
pub struct PlotContext {
    draw_counter: usize,
    scene: PlotScene,
}

impl PlotContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            draw_counter: 0,
            scene: PlotScene {
                title: title.into(),
                items: Vec::new(),
            },
        }
    }

    pub fn scene(&self) -> &PlotScene {
        &self.scene
    }

    pub fn into_scene(self) -> PlotScene {
        self.scene
    }
}

impl PlotRenderer for PlotContext {
    fn draw_track(&mut self, segment: &TrackSegment, is_muon: bool) -> Result<(), RenderError> {
        // The cursor moves before the first draw, so an event's first track is orange.
        self.draw_counter += 1;
        let segment = if is_muon {
            segment.extended(MUON_EXTENSION)
        } else {
            *segment
        };
        self.scene.items.push(SceneItem::Track {
            segment,
            color: color_for_draw(self.draw_counter),
            muon: is_muon,
        });
        Ok(())
    }

    fn draw_cluster(
        &mut self,
        phi: f64,
        theta: f64,
        eta: f64,
        amplitude: f64,
    ) -> Result<(), RenderError> {
        self.scene.items.push(SceneItem::Cluster {
            center: cluster_center(phi, theta, eta),
            radius: cluster_radius(amplitude),
        });
        Ok(())
    }
}
