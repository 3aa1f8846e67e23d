//! Stock audio units.

mod callback;
mod sine;
mod slice;

pub use callback::Callback;
pub use sine::Sine;
pub use slice::BufferSlice;

use px_ir::Frame;

use crate::unit::{AudioUnit, Fill};

/// Endless silence.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silence;

impl AudioUnit for Silence {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        out.fill(Frame::silence());
        Fill::more(out.len())
    }
}

/// The first `n` frames of another unit.
#[derive(Debug)]
pub struct Take<U> {
    inner: U,
    remaining: usize,
}

impl<U: AudioUnit> Take<U> {
    pub fn new(inner: U, frames: usize) -> Self {
        Self {
            inner,
            remaining: frames,
        }
    }

    pub fn into_inner(self) -> U {
        self.inner
    }
}

impl<U: AudioUnit> AudioUnit for Take<U> {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        let want = out.len().min(self.remaining);
        if want == 0 {
            return Fill::done(0);
        }
        let fill = self.inner.stream(&mut out[..want]);
        let n = fill.filled.min(want);
        self.remaining -= n;
        if fill.exhausted || n < want {
            self.remaining = 0;
        }
        Fill {
            filled: n,
            exhausted: self.remaining == 0,
        }
    }

    fn remaining(&self) -> Option<usize> {
        Some(match self.inner.remaining() {
            Some(inner) => inner.min(self.remaining),
            None => self.remaining,
        })
    }
}
