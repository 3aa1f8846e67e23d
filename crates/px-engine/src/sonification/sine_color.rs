//! Red picks the pitch, green picks the length.

use px_ir::Color;

use crate::strategy::Sonify;
use crate::unit::BoxedUnit;
use crate::units::{Sine, Take};

const MIN_FREQ: f64 = 30.0;
const FREQ_RANGE: f64 = 1600.0;
const MIN_MS: f64 = 10.0;
const MS_RANGE: f64 = 40.0;

/// Oscillator state carried between fragments.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SineState {
    /// Phase (in cycles) where the next fragment starts.
    pub phase: f64,
    /// Total frames produced so far.
    pub elapsed_frames: u64,
}

/// A short sine tone per pixel: `30 + 1600·r` Hz for `10 + 40·g` ms.
///
/// Consecutive fragments continue the previous fragment's phase, so a
/// traversal across similar colors sounds like one gliding tone.
#[derive(Clone, Debug)]
pub struct SineColor {
    amplitude: f32,
}

impl SineColor {
    pub fn new() -> Self {
        Self { amplitude: 1.0 }
    }

    pub fn with_amplitude(amplitude: f32) -> Self {
        Self { amplitude }
    }

    pub fn frequency(color: Color) -> f64 {
        MIN_FREQ + FREQ_RANGE * color.unit()[0]
    }

    /// Whole milliseconds; fractions are truncated.
    pub fn duration_ms(color: Color) -> u64 {
        (MIN_MS + MS_RANGE * color.unit()[1]) as u64
    }

    pub fn fragment_frames(color: Color, sample_rate: u32) -> u64 {
        sample_rate as u64 * Self::duration_ms(color) / 1000
    }
}

impl Default for SineColor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sonify for SineColor {
    type State = SineState;

    fn sonify(
        &self,
        color: Color,
        sample_rate: u32,
        prior: Option<SineState>,
    ) -> (BoxedUnit, SineState) {
        let prior = prior.unwrap_or_default();
        let freq = Self::frequency(color);
        let frames = Self::fragment_frames(color, sample_rate);
        let sine = Sine::new(freq, sample_rate, prior.phase).with_amplitude(self.amplitude);
        let increment = freq / sample_rate.max(1) as f64;
        let next = SineState {
            phase: Sine::phase_after(prior.phase, increment, frames),
            elapsed_frames: prior.elapsed_frames + frames,
        };
        (Box::new(Take::new(sine, frames as usize)), next)
    }
}
