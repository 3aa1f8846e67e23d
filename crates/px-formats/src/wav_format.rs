//! WAV encoding and decoding for PCM audio.

use std::io::Write;

use px_ir::{Frame, SampleBuffer};

use crate::FormatError;

// --- Writing ---

/// Write frames as 16-bit stereo PCM. Samples outside `-1.0..=1.0` clip.
pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = frames.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, block_align, bits_per_sample)?;
    write_data_chunk(w, frames, data_size)
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * 4);
    // Writing into a Vec cannot fail.
    let _ = write_wav(&mut buf, frames, sample_rate);
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}

fn write_data_chunk(w: &mut impl Write, frames: &[Frame], data_size: u32) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        let (left, right) = frame.to_i16();
        w.write_all(&left.to_le_bytes())?;
        w.write_all(&right.to_le_bytes())?;
    }
    Ok(())
}

// --- Reading ---

/// Decode an 8- or 16-bit PCM WAV file, mono or stereo.
pub fn load_wav(data: &[u8], name: &str) -> Result<SampleBuffer, FormatError> {
    let header = parse_header(data)?;
    let end = (header.data_offset + header.data_size).min(data.len());
    let raw = &data[header.data_offset..end];

    let buffer = match (header.bits_per_sample, header.num_channels) {
        (8, 1) => SampleBuffer::mono(name, header.sample_rate, raw.iter().map(|&b| pcm8(b)).collect()),
        (8, 2) => {
            let (left, right) = raw.chunks_exact(2).map(|c| (pcm8(c[0]), pcm8(c[1]))).unzip();
            SampleBuffer::stereo(name, header.sample_rate, left, right)
        }
        (16, 1) => {
            let data = raw.chunks_exact(2).map(|c| pcm16([c[0], c[1]])).collect();
            SampleBuffer::mono(name, header.sample_rate, data)
        }
        (16, 2) => {
            let (left, right) = raw
                .chunks_exact(4)
                .map(|c| (pcm16([c[0], c[1]]), pcm16([c[2], c[3]])))
                .unzip();
            SampleBuffer::stereo(name, header.sample_rate, left, right)
        }
        _ => return Err(FormatError::UnsupportedVersion),
    };
    Ok(buffer)
}

/// 8-bit WAV is unsigned, centred on 128.
fn pcm8(b: u8) -> f32 {
    (b as f32 - 128.0) / 128.0
}

fn pcm16(bytes: [u8; 2]) -> f32 {
    i16::from_le_bytes(bytes) as f32 / 32768.0
}

struct WavHeader {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_offset: usize,
    data_size: usize,
}

fn parse_header(data: &[u8]) -> Result<WavHeader, FormatError> {
    if data.len() < 44 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32_le(data, pos + 4) as usize;

        if chunk_id == b"fmt " && chunk_size >= 16 {
            if pos + 24 > data.len() {
                return Err(FormatError::UnexpectedEof);
            }
            let format = read_u16_le(data, pos + 8);
            if format != 1 {
                return Err(FormatError::UnsupportedVersion);
            }
            let channels = read_u16_le(data, pos + 10);
            let rate = read_u32_le(data, pos + 12);
            let bits = read_u16_le(data, pos + 22);
            fmt = Some((channels, rate, bits));
        } else if chunk_id == b"data" {
            data_chunk = Some((pos + 8, chunk_size));
        }

        pos = pos.saturating_add(8 + chunk_size);
        if pos % 2 != 0 {
            pos += 1;
        }
    }

    let (num_channels, sample_rate, bits_per_sample) = fmt.ok_or(FormatError::InvalidHeader)?;
    let (data_offset, data_size) = data_chunk.ok_or(FormatError::InvalidHeader)?;

    if bits_per_sample != 8 && bits_per_sample != 16 {
        return Err(FormatError::UnsupportedVersion);
    }
    if !(1..=2).contains(&num_channels) {
        return Err(FormatError::UnsupportedVersion);
    }

    Ok(WavHeader {
        num_channels,
        sample_rate,
        bits_per_sample,
        data_offset,
        data_size,
    })
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
