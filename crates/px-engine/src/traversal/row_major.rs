//! Top-to-bottom, left-to-right traversal.

use px_ir::{Point, Rect};

use crate::strategy::Traverse;

/// Visits every pixel once, row by row. The bottom-right pixel is the
/// terminal point and is returned with `more = false`.
///
/// Starting from the terminal point (or an empty rectangle) there is
/// nothing left to visit: the input point comes back with `more = false`.
/// A `prev` outside `bounds` is first clamped to the nearest pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct RowMajor;

impl Traverse for RowMajor {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool) {
        let Some(last) = bounds.last() else {
            return (prev, false);
        };
        let prev = bounds.clamp(prev);
        if prev == last {
            return (prev, false);
        }
        let next = if prev.x + 1 < bounds.max.x {
            Point::new(prev.x + 1, prev.y)
        } else {
            Point::new(bounds.min.x, prev.y + 1)
        };
        (next, next != last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(bounds: Rect, start: Point) -> Vec<(Point, bool)> {
        let mut out = vec![(start, true)];
        let mut p = start;
        loop {
            let (next, more) = RowMajor.traverse(p, bounds);
            out.push((next, more));
            if !more {
                return out;
            }
            p = next;
        }
    }

    #[test]
    fn three_by_two_sequence() {
        let seq = run(Rect::from_size(3, 2), Point::ORIGIN);
        let points: Vec<_> = seq.iter().map(|(p, _)| (p.x, p.y)).collect();
        assert_eq!(points, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert!(!seq.last().unwrap().1);
        assert!(seq[..seq.len() - 1].iter().all(|(_, more)| *more));
    }

    #[test]
    fn visits_every_pixel_exactly_once() {
        for (w, h) in [(1, 5), (5, 1), (4, 4), (7, 3)] {
            let bounds = Rect::from_size(w, h);
            let seq = run(bounds, Point::ORIGIN);
            let mut seen: Vec<_> = seq.iter().map(|(p, _)| *p).collect();
            assert!(seen.iter().all(|p| bounds.contains(*p)));
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len() as u64, bounds.area(), "{w}x{h}");
            assert_eq!(seq.len() as u64, bounds.area(), "{w}x{h}");
        }
    }

    #[test]
    fn offset_bounds_wrap_to_min_x() {
        let bounds = Rect::new(Point::new(2, 3), Point::new(4, 5));
        assert_eq!(RowMajor.traverse(Point::new(3, 3), bounds), (Point::new(2, 4), true));
        assert_eq!(RowMajor.traverse(Point::new(2, 4), bounds), (Point::new(3, 4), false));
    }

    #[test]
    fn terminal_and_degenerate_inputs() {
        let one = Rect::from_size(1, 1);
        assert_eq!(RowMajor.traverse(Point::ORIGIN, one), (Point::ORIGIN, false));
        let empty = Rect::from_size(0, 0);
        assert_eq!(RowMajor.traverse(Point::ORIGIN, empty), (Point::ORIGIN, false));
    }

    #[test]
    fn outside_start_stays_in_bounds() {
        let bounds = Rect::from_size(3, 2);
        assert_eq!(RowMajor.traverse(Point::new(0, 5), bounds), (Point::new(1, 1), true));
        assert_eq!(RowMajor.traverse(Point::new(9, 9), bounds), (Point::new(2, 1), false));
        for start in [Point::new(-4, 0), Point::new(0, -3), Point::new(7, 0)] {
            let seq = run(bounds, start);
            assert!(seq[1..].iter().all(|(p, _)| bounds.contains(*p)), "{start:?}");
            assert!(seq.len() as u64 <= bounds.area() + 1);
        }
    }
}
