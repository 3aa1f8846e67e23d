//! Window over a shared decoded buffer, read at a fractional rate.

use std::sync::Arc;

use px_ir::{AudioSource, Frame};

use crate::unit::{AudioUnit, Fill};

/// Plays `source[start..end]`, advancing `step` source frames per output
/// frame with linear interpolation. `step > 1` plays faster and higher.
pub struct BufferSlice {
    source: Arc<dyn AudioSource>,
    position: f64,
    end: f64,
    step: f64,
}

impl BufferSlice {
    pub fn new(source: Arc<dyn AudioSource>, start: usize, end: usize) -> Self {
        let end = end.min(source.frames());
        Self {
            source,
            position: start.min(end) as f64,
            end: end as f64,
            step: 1.0,
        }
    }

    /// Set the playback rate. Non-positive or non-finite rates are ignored.
    pub fn with_step(mut self, step: f64) -> Self {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
        self
    }
}

impl AudioUnit for BufferSlice {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        for (i, frame) in out.iter_mut().enumerate() {
            if self.position >= self.end {
                return Fill::done(i);
            }
            *frame = self.source.frame_at(self.position);
            self.position += self.step;
        }
        Fill {
            filled: out.len(),
            exhausted: self.position >= self.end,
        }
    }

    fn remaining(&self) -> Option<usize> {
        if self.position >= self.end {
            return Some(0);
        }
        Some(((self.end - self.position) / self.step).ceil() as usize)
    }
}
