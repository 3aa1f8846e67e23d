//! Phase-continuous sine oscillator.

use core::f64::consts::TAU;

use px_ir::Frame;

use crate::unit::{AudioUnit, Fill};

/// An endless sine wave.
///
/// Phase is measured in cycles (`0.0..1.0`). Each sample is computed from
/// the start phase and the sample index, so long runs do not drift.
#[derive(Clone, Debug)]
pub struct Sine {
    start_phase: f64,
    increment: f64,
    index: u64,
    amplitude: f32,
}

impl Sine {
    pub fn new(freq: f64, sample_rate: u32, phase: f64) -> Self {
        Self {
            start_phase: phase.rem_euclid(1.0),
            increment: freq / sample_rate.max(1) as f64,
            index: 0,
            amplitude: 1.0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Phase (in cycles) of the next sample to be produced.
    pub fn phase(&self) -> f64 {
        Self::phase_after(self.start_phase, self.increment, self.index)
    }

    /// Phase reached after `frames` samples at `increment` cycles per sample.
    pub fn phase_after(phase: f64, increment: f64, frames: u64) -> f64 {
        (phase + increment * frames as f64).rem_euclid(1.0)
    }
}

impl AudioUnit for Sine {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        for frame in out.iter_mut() {
            let phase = Self::phase_after(self.start_phase, self.increment, self.index);
            *frame = Frame::mono((phase * TAU).sin() as f32 * self.amplitude);
            self.index += 1;
        }
        Fill::more(out.len())
    }
}
