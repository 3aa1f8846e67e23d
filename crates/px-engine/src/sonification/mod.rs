//! Stock sonification strategies.

mod audio_scrubber;
mod sine_color;

pub use audio_scrubber::{AudioScrubber, ScrubState};
pub use sine_color::{SineColor, SineState};
