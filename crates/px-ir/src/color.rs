//! 8-bit RGBA colors.

/// A straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Channels scaled to `0.0..=1.0`, in `[r, g, b, a]` order.
    pub fn unit(&self) -> [f64; 4] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_range_endpoints() {
        assert_eq!(Color::BLACK.unit(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(Color::WHITE.unit(), [1.0, 1.0, 1.0, 1.0]);
        let [r, g, b, a] = Color::rgba(51, 102, 204, 0).unit();
        assert!((r - 0.2).abs() < 1e-12);
        assert!((g - 0.4).abs() < 1e-12);
        assert!((b - 0.8).abs() < 1e-12);
        assert_eq!(a, 0.0);
    }
}
