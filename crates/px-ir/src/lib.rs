//! Core data types for pixelsound.
//!
//! Everything the engine and its collaborators exchange lives here:
//! pixel geometry, colors, stereo frames, and the contracts for decoded
//! images and decoded audio.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod color;
mod frame;
mod geometry;
mod media;
mod sample_buffer;

pub use color::Color;
pub use frame::Frame;
pub use geometry::{Point, Rect};
pub use media::{AudioSource, PixelGrid, PixelSource};
pub use sample_buffer::SampleBuffer;
