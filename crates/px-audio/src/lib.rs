//! Audio output backends for pixelsound.

mod null;
mod render_thread;
mod speaker;
mod traits;

pub use null::NullOutput;
pub use speaker::Speaker;
pub use traits::{AudioError, AudioOutput};

/// Frames rendered per cycle when no size is requested.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;
