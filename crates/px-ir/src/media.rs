//! Contracts for decoded images and decoded audio.

use alloc::vec;
use alloc::vec::Vec;

use crate::color::Color;
use crate::frame::Frame;
use crate::geometry::{Point, Rect};

/// Random-access pixel lookup over rectangular bounds.
pub trait PixelSource: Send + Sync {
    fn bounds(&self) -> Rect;

    /// Color at `p`. Points outside `bounds()` read as transparent black.
    fn color_at(&self, p: Point) -> Color;
}

/// Random-access stereo sample reading with a known length and rate.
pub trait AudioSource: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Number of frames in the source.
    fn frames(&self) -> usize;

    /// Frame at `index`; silence past the end.
    fn frame(&self, index: usize) -> Frame;

    /// Linearly interpolated frame at a fractional position.
    fn frame_at(&self, pos: f64) -> Frame {
        if pos < 0.0 {
            return Frame::silence();
        }
        let idx = libm::floor(pos);
        let frac = (pos - idx) as f32;
        let idx = idx as usize;
        self.frame(idx).lerp(self.frame(idx + 1), frac)
    }
}

/// An in-memory image, row-major.
#[derive(Clone, Debug)]
pub struct PixelGrid {
    bounds: Rect,
    pixels: Vec<Color>,
}

impl PixelGrid {
    /// A grid of the given size filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            bounds: Rect::from_size(width as i32, height as i32),
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Build a grid from row-major pixels. Returns `None` if the pixel
    /// count does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            bounds: Rect::from_size(width as i32, height as i32),
            pixels,
        })
    }

    /// Build a grid by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(Point) -> Color) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                pixels.push(f(Point::new(x, y)));
            }
        }
        Self {
            bounds: Rect::from_size(width as i32, height as i32),
            pixels,
        }
    }

    pub fn set(&mut self, p: Point, color: Color) {
        if let Some(i) = self.index(p) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let x = (p.x - self.bounds.min.x) as usize;
        let y = (p.y - self.bounds.min.y) as usize;
        Some(y * self.bounds.width() as usize + x)
    }
}

impl PixelSource for PixelGrid {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn color_at(&self, p: Point) -> Color {
        self.index(p)
            .map(|i| self.pixels[i])
            .unwrap_or(Color::rgba(0, 0, 0, 0))
    }
}
