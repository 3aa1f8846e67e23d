//! Image decoding into a pixel grid.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use px_ir::{Color, PixelGrid};

use crate::FormatError;

/// Open an image file and scale it to `width` pixels wide (aspect kept,
/// nearest neighbour). `None` keeps the original size.
pub fn load_image(path: &Path, width: Option<u32>) -> Result<PixelGrid, FormatError> {
    let img = image::open(path)?;
    log::debug!("decoded {}: {}x{}", path.display(), img.width(), img.height());
    Ok(to_grid(img, width))
}

/// Decode an in-memory image; see [`load_image`].
pub fn decode_image(data: &[u8], width: Option<u32>) -> Result<PixelGrid, FormatError> {
    let img = image::load_from_memory(data)?;
    Ok(to_grid(img, width))
}

fn to_grid(img: DynamicImage, width: Option<u32>) -> PixelGrid {
    let img = match width {
        Some(w) if w > 0 && w != img.width() && img.width() > 0 => {
            let h = (img.height() as f64 * w as f64 / img.width() as f64).round().max(1.0) as u32;
            img.resize_exact(w, h, FilterType::Nearest)
        }
        _ => img,
    };
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    PixelGrid::from_fn(w, h, |p| {
        let [r, g, b, a] = rgba.get_pixel(p.x as u32, p.y as u32).0;
        Color::rgba(r, g, b, a)
    })
}
