//! The pull-based audio unit contract.

use px_ir::Frame;

/// Result of one [`AudioUnit::stream`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fill {
    /// Number of leading frames written.
    pub filled: usize,
    /// The unit has nothing more to produce.
    pub exhausted: bool,
}

impl Fill {
    /// `filled` frames written, more to come.
    pub const fn more(filled: usize) -> Self {
        Self { filled, exhausted: false }
    }

    /// `filled` frames written, and the unit is now finished.
    pub const fn done(filled: usize) -> Self {
        Self { filled, exhausted: true }
    }
}

/// A pull-based producer of stereo frames.
///
/// `stream` fills as many leading frames of `out` as it can. A unit that
/// writes fewer frames than requested is treated as exhausted even if it
/// does not say so. Implementations must not block.
pub trait AudioUnit: Send {
    fn stream(&mut self, out: &mut [Frame]) -> Fill;

    /// Frames left to produce, if known. `None` means unbounded or unknown.
    fn remaining(&self) -> Option<usize> {
        None
    }
}

pub type BoxedUnit = Box<dyn AudioUnit>;

impl<U: AudioUnit + ?Sized> AudioUnit for Box<U> {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        (**self).stream(out)
    }

    fn remaining(&self) -> Option<usize> {
        (**self).remaining()
    }
}
