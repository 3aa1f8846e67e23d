//! Zero-length unit that runs a closure when the renderer reaches it.

use px_ir::Frame;

use crate::unit::{AudioUnit, Fill};

/// Runs `f` once, the first time it is streamed, and produces no audio.
///
/// Because the queue continues with the next unit in the same render
/// call, a callback marks an exact sample position without adding a gap.
/// The closure runs on the render thread: it must not block or allocate.
pub struct Callback<F> {
    f: Option<F>,
}

impl<F: FnOnce() + Send> Callback<F> {
    pub fn new(f: F) -> Self {
        Self { f: Some(f) }
    }
}

impl<F: FnOnce() + Send> AudioUnit for Callback<F> {
    fn stream(&mut self, _out: &mut [Frame]) -> Fill {
        if let Some(f) = self.f.take() {
            f();
        }
        Fill::done(0)
    }

    fn remaining(&self) -> Option<usize> {
        Some(0)
    }
}
