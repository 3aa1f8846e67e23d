//! Headless controller for pixelsound.
//!
//! Wires an image, a strategy, a player and an output together from a
//! [`SessionConfig`], so the CLI and tests share one setup path.

mod config;
mod input;
pub mod registry;
mod session;

use thiserror::Error;

// Re-export common types so callers don't need px-ir/px-engine directly.
pub use px_audio::{AudioError, AudioOutput, NullOutput, Speaker};
pub use px_engine::{
    Drive, LatestPoint, Player, PlayerConfig, PlayerError, PlayerState, PointPublishing,
    PointReceiver,
};
pub use px_formats::FormatError;
pub use px_ir::{Color, Frame, PixelGrid, Point, Rect};

pub use config::{SessionConfig, TriggerMode};
pub use input::{
    bind_pointer, InputRegistry, Key, KeyRepeat, KeyboardCursor, Subscription, REPEAT_DELAY,
    REPEAT_INTERVAL,
};
pub use session::{render_offline, render_to_wav, Session};

/// Setup failures. All of them are fatal and reported before playback.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no traversal named {0:?}")]
    UnknownTraversal(String),
    #[error("no sonification named {0:?}")]
    UnknownSonification(String),
    #[error("this sonification needs an audio file")]
    MissingAudioSource,
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
