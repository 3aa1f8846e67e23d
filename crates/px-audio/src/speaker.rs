//! CPAL-based audio output backend.

use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use px_engine::{Frame, SharedMixer};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};

use crate::render_thread::{RenderThread, Sink};
use crate::traits::{AudioError, AudioOutput};

/// The default output device.
///
/// A render thread fills a ring buffer one block at a time under the
/// render lock; the device callback only pops from the ring, so it never
/// contends for the lock.
pub struct Speaker {
    device: Device,
    config: StreamConfig,
    buffer_size: usize,
    stream: Option<Stream>,
    thread: Option<RenderThread>,
}

impl Speaker {
    pub fn new(buffer_size: usize) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The callback interleaves exactly two channels.
        config.channels = 2;

        if let Ok(name) = device.name() {
            log::info!("output device: {name}, {} Hz", config.sample_rate.0);
        }

        Ok(Self {
            device,
            config,
            buffer_size: buffer_size.max(1),
            stream: None,
            thread: None,
        })
    }

    fn period(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_size as f64 / self.config.sample_rate.0.max(1) as f64)
    }
}

struct Ring(HeapProd<Frame>);

impl Sink for Ring {
    fn ready(&mut self, frames: usize) -> bool {
        self.0.vacant_len() >= frames
    }

    fn push(&mut self, block: &[Frame]) {
        self.0.push_slice(block);
    }
}

impl AudioOutput for Speaker {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self, mixer: SharedMixer) -> Result<(), AudioError> {
        self.stop()?;

        let (producer, mut consumer) = HeapRb::<Frame>::new(self.buffer_size * 2).split();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(channels) {
                        let frame = consumer.try_pop().unwrap_or_default();
                        for (i, sample) in chunk.iter_mut().enumerate() {
                            *sample = match i {
                                0 => frame.left,
                                1 => frame.right,
                                _ => 0.0,
                            };
                        }
                    }
                },
                |err| log::warn!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);

        let idle = self.period() / 4;
        self.thread = Some(RenderThread::spawn(mixer, Ring(producer), self.buffer_size, idle));
        log::info!("speaker started: {} frame buffer", self.buffer_size);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut thread) = self.thread.take() {
            thread.stop();
        }
        if let Some(stream) = self.stream.take() {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
