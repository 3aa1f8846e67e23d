//! Sequential playback queue drained by the render callback.

use std::collections::VecDeque;

use px_ir::Frame;

use crate::unit::BoxedUnit;

/// Initial slot count for pending units. Growth only happens in `add`.
const QUEUE_CAPACITY: usize = 64;

/// Plays units back-to-back, and silence when there is nothing to play.
///
/// The head unit is the only one ever partially drained. The queue moves
/// past a unit only once it reports exhaustion, and the next unit continues
/// in the same render call, so there is no gap and no repeated frame at a
/// boundary.
///
/// `render` never allocates or frees: finished units stay in place ahead
/// of `head` and are released by whoever next calls
/// [`take_retired`](Self::take_retired) or [`clear`](Self::clear).
pub struct PlaybackQueue {
    units: VecDeque<BoxedUnit>,
    /// Index of the unit currently playing. Everything before it is done.
    head: usize,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self {
            units: VecDeque::with_capacity(QUEUE_CAPACITY),
            head: 0,
        }
    }

    /// Append a unit to the tail.
    pub fn add(&mut self, unit: BoxedUnit) {
        self.units.push_back(unit);
    }

    /// Drop every pending unit. The returned [`Retired`] owns them so the
    /// caller can free them after releasing the render lock.
    pub fn clear(&mut self) -> Retired {
        self.head = 0;
        Retired {
            units: self.units.drain(..).collect(),
        }
    }

    /// Hand over units that finished playing since the last call.
    pub fn take_retired(&mut self) -> Retired {
        let done = std::mem::take(&mut self.head);
        Retired {
            units: self.units.drain(..done).collect(),
        }
    }

    /// Number of pending units, including the one currently playing.
    pub fn len(&self) -> usize {
        self.units.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `out` from the head of the queue; pad with silence once empty.
    pub fn render(&mut self, out: &mut [Frame]) {
        let mut filled = 0;
        while filled < out.len() {
            let Some(head) = self.units.get_mut(self.head) else {
                out[filled..].fill(Frame::silence());
                return;
            };
            let want = out.len() - filled;
            let fill = head.stream(&mut out[filled..]);
            let n = fill.filled.min(want);
            filled += n;
            if fill.exhausted || n < want {
                self.head += 1;
            }
        }
    }
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Units removed from the queue, freed when this value is dropped.
#[must_use = "dropping frees the units; hold it until the render lock is released"]
#[derive(Default)]
pub struct Retired {
    units: Vec<BoxedUnit>,
}

impl Retired {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
