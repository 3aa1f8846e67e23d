//! Scrubs through a decoded sample buffer, steered by color.

use std::sync::Arc;

use px_ir::{AudioSource, Color};

use crate::strategy::Sonify;
use crate::unit::BoxedUnit;
use crate::units::BufferSlice;

/// Longest fragment, as a share of the source length.
const MAX_SLICE: f64 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrubState {
    pub fragments: u64,
    /// Source frames covered by all fragments so far.
    pub source_frames: u64,
}

/// Plays a slice of a pre-loaded buffer per pixel.
///
/// Green sets the slice length (up to a tenth of the buffer), red sets
/// where it starts, and blue sets the speed: below half-blue plays faster
/// (`1 + 2b`), above it slower (`0.5 + (1 - b)`). Any mismatch between
/// the source and output sample rates is folded into the same ratio.
pub struct AudioScrubber {
    source: Arc<dyn AudioSource>,
}

impl AudioScrubber {
    pub fn new(source: Arc<dyn AudioSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn AudioSource> {
        &self.source
    }

    /// `(start, len)` of the slice for `color`, in source frames.
    pub fn window(&self, color: Color) -> (usize, usize) {
        let [r, g, _, _] = color.unit();
        let total = self.source.frames();
        let len = (MAX_SLICE * g * total as f64) as usize;
        let start = (r * (total - len) as f64) as usize;
        (start, len)
    }

    pub fn speed(color: Color) -> f64 {
        let b = color.unit()[2];
        if b < 0.5 {
            1.0 + 2.0 * b
        } else {
            0.5 + (1.0 - b)
        }
    }
}

impl Sonify for AudioScrubber {
    type State = ScrubState;

    fn sonify(
        &self,
        color: Color,
        sample_rate: u32,
        prior: Option<ScrubState>,
    ) -> (BoxedUnit, ScrubState) {
        let prior = prior.unwrap_or_default();
        let (start, len) = self.window(color);
        let step = Self::speed(color) * self.source.sample_rate() as f64 / sample_rate.max(1) as f64;
        let slice = BufferSlice::new(self.source.clone(), start, start + len).with_step(step);
        let next = ScrubState {
            fragments: prior.fragments + 1,
            source_frames: prior.source_frames + len as u64,
        };
        (Box::new(slice), next)
    }
}
