//! Render callback: the playback queue behind transport controls.

use std::sync::{Arc, Mutex, MutexGuard};

use px_ir::Frame;

use crate::queue::PlaybackQueue;

/// The render lock shared between the player and the output subsystem.
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Lock the mixer. A poisoned lock is recovered: every mutation through
/// the guard leaves the mixer consistent between statements.
pub fn lock_mixer(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|e| e.into_inner())
}

/// Pause, mute and volume state consulted on every render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    paused: bool,
    muted: bool,
    /// Exponent of a base-2 gain: 0 is unity, -1 is half amplitude.
    volume: f64,
    gain: f32,
}

impl Transport {
    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Linear gain applied to rendered frames, accounting for mute.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.gain
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() { volume } else { 0.0 };
        self.volume = volume;
        self.gain = 2f64.powf(volume) as f32;
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            paused: false,
            muted: false,
            volume: 0.0,
            gain: 1.0,
        }
    }
}

/// Owns the playback queue and transport state.
///
/// Everything here is mutated only while holding the render lock, so a
/// render call always sees a consistent transport.
#[derive(Default)]
pub struct Mixer {
    pub queue: PlaybackQueue,
    pub transport: Transport,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMixer {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Fill `out` completely. Paused output is silence and leaves the
    /// queue untouched; muted output still drains the queue.
    pub fn render(&mut self, out: &mut [Frame]) {
        if self.transport.paused {
            out.fill(Frame::silence());
            return;
        }
        self.queue.render(out);
        let gain = self.transport.gain();
        if gain != 1.0 {
            for frame in out.iter_mut() {
                frame.apply_gain(gain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Sine, Take};

    fn tone(frames: usize) -> crate::unit::BoxedUnit {
        // 1 Hz at 4 Hz: 0, 1, 0, -1, ...
        Box::new(Take::new(Sine::new(1.0, 4, 0.25), frames))
    }

    #[test]
    fn volume_is_base_two() {
        let mut t = Transport::default();
        assert_eq!(t.gain(), 1.0);
        t.set_volume(-1.0);
        assert!((t.gain() - 0.5).abs() < 1e-6);
        t.set_volume(2.0);
        assert!((t.gain() - 4.0).abs() < 1e-6);
        t.set_volume(f64::NAN);
        assert_eq!(t.gain(), 1.0);
    }

    #[test]
    fn paused_renders_silence_without_draining() {
        let mut m = Mixer::new();
        m.queue.add(tone(4));
        m.transport.set_paused(true);
        let mut out = [Frame::mono(0.3); 4];
        m.render(&mut out);
        assert!(out.iter().all(Frame::is_silent));
        assert_eq!(m.queue.len(), 1);

        m.transport.set_paused(false);
        m.render(&mut out);
        assert!((out[0].left - 1.0).abs() < 1e-6);
    }

    #[test]
    fn muted_drains_but_is_silent() {
        let mut m = Mixer::new();
        m.queue.add(tone(4));
        m.transport.set_muted(true);
        let mut out = [Frame::silence(); 4];
        m.render(&mut out);
        assert!(out.iter().all(|f| f.left == 0.0));
        assert!(m.queue.is_empty());
    }

    #[test]
    fn volume_scales_output() {
        let mut m = Mixer::new();
        m.queue.add(tone(1));
        m.transport.set_volume(-1.0);
        let mut out = [Frame::silence(); 1];
        m.render(&mut out);
        assert!((out[0].left - 0.5).abs() < 1e-6);
    }
}
