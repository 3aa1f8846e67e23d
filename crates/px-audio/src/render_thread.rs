//! The render loop shared by every backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use px_engine::{lock_mixer, Frame, SharedMixer};

/// Where rendered blocks go.
pub(crate) trait Sink: Send + 'static {
    /// Whether a block of `frames` can be accepted now.
    fn ready(&mut self, frames: usize) -> bool;

    fn push(&mut self, block: &[Frame]);
}

/// Renders fixed-size blocks from the mixer into a sink until stopped.
pub(crate) struct RenderThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// `idle` is how long to sleep when the sink has no room.
    pub fn spawn<S: Sink>(mixer: SharedMixer, mut sink: S, buffer_size: usize, idle: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = std::thread::spawn(move || {
            let mut block = vec![Frame::silence(); buffer_size.max(1)];
            while flag.load(Ordering::Relaxed) {
                if !sink.ready(block.len()) {
                    std::thread::sleep(idle);
                    continue;
                }
                let retired = {
                    let mut mixer = lock_mixer(&mixer);
                    render(&mut mixer, &mut block);
                    mixer.queue.take_retired()
                };
                drop(retired);
                sink.push(&block);
            }
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "alloc_check")]
fn render(mixer: &mut px_engine::Mixer, block: &mut [Frame]) {
    assert_no_alloc::assert_no_alloc(|| mixer.render(block));
}

#[cfg(not(feature = "alloc_check"))]
fn render(mixer: &mut px_engine::Mixer, block: &mut [Frame]) {
    mixer.render(block);
}
