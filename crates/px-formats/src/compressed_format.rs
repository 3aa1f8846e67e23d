//! MP3, Ogg Vorbis and FLAC decoding through symphonia.

use std::io::{Cursor, ErrorKind};

use px_ir::SampleBuffer;
use symphonia::core::audio::SampleBuffer as Interleaved;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as DecodeError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::FormatError;

/// Decode a whole file held in memory. `extension` is only a hint; the container
/// is still detected from the bytes.
///
/// Mono sources are duplicated onto both channels. Anything past the
/// first two channels is dropped.
pub fn decode_audio(data: Vec<u8>, extension: &str, name: &str) -> Result<SampleBuffer, FormatError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(extension);

    let opened = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = opened.format;

    let track = format
        .default_track()
        .ok_or_else(|| FormatError::UnsupportedFormat(format!("{extension}: no audio track")))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| FormatError::UnsupportedFormat(format!("{extension}: unknown sample rate")))?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut skipped = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(DecodeError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(DecodeError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(DecodeError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buf = Interleaved::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks_exact(channels) {
            left.push(frame[0]);
            right.push(frame[channels.min(2) - 1]);
        }
    }

    if skipped > 0 {
        log::warn!("{name}: skipped {skipped} undecodable packets");
    }
    Ok(SampleBuffer::stereo(name, sample_rate, left, right))
}
