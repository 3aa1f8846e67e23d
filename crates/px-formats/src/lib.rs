//! Decoders for pixelsound.
//!
//! Images become [`PixelGrid`]s, audio files become [`SampleBuffer`]s, and
//! rendered frames can be written back out as WAV.

mod compressed_format;
mod image_format;
mod wav_format;

use std::path::Path;

use px_ir::{AudioSource, SampleBuffer};
use thiserror::Error;

pub use compressed_format::decode_audio;
pub use image_format::{decode_image, load_image};
pub use wav_format::{frames_to_wav, load_wav, write_wav};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid file header")]
    InvalidHeader,
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("unsupported format version")]
    UnsupportedVersion,
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("audio decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Decode an audio file, picking the decoder from the file extension.
/// WAV is read directly; MP3, Ogg Vorbis and FLAC go through symphonia.
pub fn load_audio(path: &Path) -> Result<SampleBuffer, FormatError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let buffer = match ext.as_str() {
        "wav" | "wave" => load_wav(&std::fs::read(path)?, name)?,
        "mp3" | "ogg" | "oga" | "flac" => decode_audio(std::fs::read(path)?, &ext, name)?,
        _ => return Err(FormatError::UnsupportedFormat(ext)),
    };
    log::debug!(
        "decoded {}: {} frames at {} Hz",
        path.display(),
        buffer.len(),
        buffer.sample_rate()
    );
    Ok(buffer)
}
