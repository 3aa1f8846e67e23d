//! Audio frame type.

/// A stereo audio frame, nominally within `-1.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Scale both channels by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        self.left *= gain;
        self.right *= gain;
    }

    /// Linear blend towards `other` by `t` in `0.0..=1.0`.
    pub fn lerp(self, other: Frame, t: f32) -> Frame {
        Frame {
            left: self.left + (other.left - self.left) * t,
            right: self.right + (other.right - self.right) * t,
        }
    }

    /// Convert to clamped 16-bit PCM.
    pub fn to_i16(self) -> (i16, i16) {
        let conv = |s: f32| (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        (conv(self.left), conv(self.right))
    }
}
