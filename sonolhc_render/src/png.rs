//! PNG export of a `PlotScene` with two fixed projections.
//!
//! Left panel: transverse view (X, Y, Z) inside ±150 cm.
//! Right panel: longitudinal view (Z, Y, X) inside ±300 cm.
//! Both are seen from above. The panels carry no text, so no font backend
//! is needed.

use crate::canvas::{PlotScene, SceneItem};
use crate::error::RenderError;
use nalgebra::Vector3;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::path::Path;

/// Image size of the exported figure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PngConfig {
    /// Width in pixels (default: 1600)
    pub width: u32,

    /// Height in pixels (default: 800)
    pub height: u32,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Transverse,
    Longitudinal,
}

impl Projection {
    fn half_extent(&self) -> f64 {
        match self {
            Projection::Transverse => 150.0,
            Projection::Longitudinal => 300.0,
        }
    }

    fn map(&self, p: &Vector3<f64>) -> (f64, f64, f64) {
        match self {
            Projection::Transverse => (p.x, p.y, p.z),
            Projection::Longitudinal => (p.z, p.y, p.x),
        }
    }
}

/// Renders the scene to a PNG file.
pub fn write_png(scene: &PlotScene, path: &Path, config: &PngConfig) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(RenderError::plot)?;

    let panels = root.split_evenly((1, 2));
    for (panel, projection) in panels
        .iter()
        .zip([Projection::Transverse, Projection::Longitudinal])
    {
        draw_panel(panel, scene, projection)?;
    }

    root.present().map_err(RenderError::plot)?;
    tracing::debug!("Wrote plot {} ({} items)", path.display(), scene.items.len());
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    scene: &PlotScene,
    projection: Projection,
) -> Result<(), RenderError> {
    let e = projection.half_extent();
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .build_cartesian_3d(-e..e, -e..e, -e..e)
        .map_err(RenderError::plot)?;
    chart.with_projection(|mut pb| {
        pb.pitch = FRAC_PI_2;
        pb.yaw = 0.0;
        pb.scale = 0.9;
        pb.into_matrix()
    });

    for edge in cube_edges(e) {
        chart
            .draw_series(LineSeries::new(edge, &BLACK.mix(0.2)))
            .map_err(RenderError::plot)?;
    }

    let (w, h) = area.dim_in_pixel();
    let pixels_per_cm = w.min(h) as f64 * 0.9 / (2.0 * e);

    for item in &scene.items {
        match item {
            SceneItem::Track { segment, color, .. } => {
                let (r, g, b) = color.rgb();
                chart
                    .draw_series(LineSeries::new(
                        [projection.map(&segment.start), projection.map(&segment.end)],
                        &RGBColor(r, g, b),
                    ))
                    .map_err(RenderError::plot)?;
            }
            SceneItem::Cluster { center, radius } => {
                let size = (radius * pixels_per_cm).round().max(1.0) as i32;
                chart
                    .draw_series(std::iter::once(Circle::new(
                        projection.map(center),
                        size,
                        BLACK.filled(),
                    )))
                    .map_err(RenderError::plot)?;
            }
        }
    }

    Ok(())
}

fn cube_edges(e: f64) -> Vec<[(f64, f64, f64); 2]> {
    let corners = [-e, e];
    let mut edges = Vec::with_capacity(12);
    for &a in &corners {
        for &b in &corners {
            edges.push([(-e, a, b), (e, a, b)]);
            edges.push([(a, -e, b), (a, e, b)]);
            edges.push([(a, b, -e), (a, b, e)]);
        }
    }
    edges
}
