//! Session configuration.

use std::path::PathBuf;

use px_engine::PointPublishing;

/// How pixels get chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// The traversal strategy walks the image on its own.
    #[default]
    Traverse,
    /// Arrow keys move a cursor; each move sounds one pixel.
    Keyboard,
    /// The pixel under the pointer sounds whenever the pointer moves.
    Pointer,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub image: PathBuf,
    /// Images are scaled to this width before playback. `None` keeps the
    /// original size.
    pub resize_width: Option<u32>,
    /// Source for sample-scrubbing sonifications.
    pub audio: Option<PathBuf>,
    pub traversal: String,
    pub sonification: String,
    pub trigger: TriggerMode,
    /// Keyboard- and pointer-triggered pixels queue behind each other
    /// instead of cutting off what is playing.
    pub queue: bool,
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub volume: f64,
    pub publishing: PointPublishing,
    pub channel_capacity: usize,
    pub lookahead: usize,
    /// Seed for random traversals; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::new(),
            resize_width: Some(100),
            audio: None,
            traversal: "RowMajor".to_string(),
            sonification: "SineColor".to_string(),
            trigger: TriggerMode::default(),
            queue: false,
            sample_rate: 44_100,
            buffer_size: px_audio::DEFAULT_BUFFER_SIZE,
            volume: 0.0,
            publishing: PointPublishing::Latest,
            channel_capacity: 60,
            lookahead: 2,
            seed: None,
        }
    }
}
