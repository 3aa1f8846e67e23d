//! Decoded audio held in memory.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::frame::Frame;
use crate::media::AudioSource;

/// A decoded stereo sample buffer in planar layout.
///
/// Mono sources are stored with identical left and right planes.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    /// Display name (usually the file stem), truncated to fit.
    pub name: ArrayString<32>,
    sample_rate: u32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SampleBuffer {
    /// Create a stereo buffer. The longer plane is truncated to the
    /// shorter one.
    pub fn stereo(name: &str, sample_rate: u32, mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self {
            name: truncated_name(name),
            sample_rate,
            left,
            right,
        }
    }

    pub fn mono(name: &str, sample_rate: u32, data: Vec<f32>) -> Self {
        let right = data.clone();
        Self::stereo(name, sample_rate, data, right)
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }
}

fn truncated_name(name: &str) -> ArrayString<32> {
    let mut out = ArrayString::new();
    for c in name.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

impl AudioSource for SampleBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frames(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Frame {
        match (self.left.get(index), self.right.get(index)) {
            (Some(&l), Some(&r)) => Frame::new(l, r),
            _ => Frame::silence(),
        }
    }
}
