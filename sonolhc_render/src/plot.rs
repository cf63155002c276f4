//! Plot rendering backend abstraction.

use crate::error::RenderError;
use crate::types::TrackSegment;

/// Receives the 3D draw calls for one event.
///
/// Calls arrive in the same order as audio rendering.
pub trait PlotRenderer {
    /// Draws a track segment. Muon tracks are extended past the inner detector.
    fn draw_track(&mut self, segment: &TrackSegment, is_muon: bool) -> Result<(), RenderError>;

    /// Draws a calorimeter deposit as a sphere at (phi, theta, eta).
    fn draw_cluster(
        &mut self,
        phi: f64,
        theta: f64,
        eta: f64,
        amplitude: f64,
    ) -> Result<(), RenderError>;
}
