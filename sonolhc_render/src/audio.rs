//! Audio rendering backend abstraction.

use crate::error::RenderError;
use crate::types::Profile;

/// Turns a symbolic profile into a concrete sound clip.
///
/// The event pass only ever calls `render` with one of the six profiles and
/// concatenates the returned clips in event order through `append`.
pub trait AudioRenderer {
    /// Opaque audio handle produced by this backend.
    type Clip;

    /// Returns an empty clip to accumulate one event into.
    fn empty(&self) -> Self::Clip;

    /// Renders one entity.
    ///
    /// `amplitude` is the cluster energy already divided by the energy scale
    /// (0 for profiles without a cluster).
    fn render(
        &mut self,
        profile: Profile,
        amplitude: f64,
        companion_present: bool,
    ) -> Result<Self::Clip, RenderError>;

    /// Appends `clip` to `into`, followed by `gap_seconds` of silence.
    fn append(&mut self, into: &mut Self::Clip, clip: &Self::Clip, gap_seconds: f64);
}
