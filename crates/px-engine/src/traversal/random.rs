//! Uniformly random traversal.

use std::sync::Mutex;

use px_ir::{Point, Rect};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::strategy::Traverse;

/// Jumps to a uniformly random pixel on every step and never finishes.
///
/// Seeded runs are reproducible.
pub struct Random {
    rng: Mutex<Pcg32>,
}

impl Random {
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Traverse for Random {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool) {
        if bounds.is_empty() {
            return (prev, false);
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let x = rng.random_range(bounds.min.x..bounds.max.x);
        let y = rng.random_range(bounds.min.y..bounds.max.y);
        (Point::new(x, y), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_bounds_and_never_finishes() {
        let r = Random::with_seed(7);
        let bounds = Rect::new(Point::new(10, 20), Point::new(13, 22));
        let mut p = bounds.min;
        for _ in 0..500 {
            let (next, more) = r.traverse(p, bounds);
            assert!(bounds.contains(next), "{next} outside");
            assert!(more);
            p = next;
        }
    }

    #[test]
    fn seeded_runs_repeat() {
        let bounds = Rect::from_size(100, 100);
        let a = Random::with_seed(42);
        let b = Random::with_seed(42);
        for _ in 0..50 {
            assert_eq!(a.traverse(Point::ORIGIN, bounds), b.traverse(Point::ORIGIN, bounds));
        }
    }

    #[test]
    fn empty_bounds_finish_immediately() {
        let r = Random::with_seed(1);
        assert_eq!(r.traverse(Point::new(3, 3), Rect::from_size(0, 4)), (Point::new(3, 3), false));
    }
}
