//! Playback engine for pixelsound.
//!
//! Turns a traversal over an image into a continuous audio signal. The
//! [`Player`] asks a [`Strategy`] to sonify pixels, queues the resulting
//! [`AudioUnit`]s on the [`PlaybackQueue`], and the output subsystem drains
//! the queue through [`Mixer::render`] at its own cadence.

mod config;
mod error;
mod mixer;
mod player;
mod priority_lock;
mod queue;
pub mod sonification;
mod strategy;
pub mod traversal;
mod unit;
pub mod units;

pub use config::{Drive, PlayerConfig, PointPublishing};
pub use error::PlayerError;
pub use mixer::{lock_mixer, Mixer, SharedMixer, Transport};
pub use player::{Cursor, LatestPoint, Player, PlayerState, PointReceiver};
pub use priority_lock::{PriorityGuard, PriorityLock};
pub use px_ir::{Color, Frame, PixelSource, Point, Rect};
pub use queue::{PlaybackQueue, Retired};
pub use strategy::{CarriedState, PixelSound, Sonify, Strategy, Traverse};
pub use unit::{AudioUnit, BoxedUnit, Fill};
