//! Audio output trait and error types.

use px_engine::SharedMixer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// An output subsystem that pulls audio from a mixer at a fixed cadence.
///
/// The mixer's mutex is the render lock: every render cycle holds it for
/// exactly one [`Mixer::render`](px_engine::Mixer::render) call.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Frames rendered per cycle.
    fn buffer_size(&self) -> usize;

    /// Start pulling from `mixer`. Restarting replaces the previous mixer.
    fn start(&mut self, mixer: SharedMixer) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}
