//! Output that renders in real time and discards the result.

use std::time::{Duration, Instant};

use px_engine::{Frame, SharedMixer};

use crate::render_thread::{RenderThread, Sink};
use crate::traits::{AudioError, AudioOutput};

/// Drains the mixer at the pace a sound card would, without one.
///
/// Used headless and in tests: continuations, cues and point events all
/// behave as with a real device.
pub struct NullOutput {
    sample_rate: u32,
    buffer_size: usize,
    thread: Option<RenderThread>,
}

impl NullOutput {
    pub fn new(sample_rate: u32, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            buffer_size: buffer_size.max(1),
            thread: None,
        }
    }

    fn period(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_size as f64 / self.sample_rate.max(1) as f64)
    }
}

struct Clock {
    next: Instant,
    period: Duration,
}

impl Sink for Clock {
    fn ready(&mut self, _frames: usize) -> bool {
        let now = Instant::now();
        if now < self.next {
            return false;
        }
        self.next += self.period;
        // Fell far behind: resynchronise instead of bursting.
        if self.next + self.period < now {
            self.next = now;
        }
        true
    }

    fn push(&mut self, _block: &[Frame]) {}
}

impl AudioOutput for NullOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self, mixer: SharedMixer) -> Result<(), AudioError> {
        self.stop()?;
        let period = self.period();
        let clock = Clock {
            next: Instant::now(),
            period,
        };
        let idle = (period / 4).max(Duration::from_micros(100));
        self.thread = Some(RenderThread::spawn(mixer, clock, self.buffer_size, idle));
        log::info!(
            "null output started: {} Hz, {} frame buffer",
            self.sample_rate,
            self.buffer_size
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut thread) = self.thread.take() {
            thread.stop();
        }
        Ok(())
    }
}
