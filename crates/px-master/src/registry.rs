//! Strategies by name.

use std::path::Path;
use std::sync::Arc;

use px_engine::sonification::{AudioScrubber, SineColor};
use px_engine::traversal::{Random, RowMajor};
use px_engine::{PixelSound, Sonify, Strategy, Traverse};
use px_ir::AudioSource;

use crate::ConfigError;

pub const TRAVERSALS: &[&str] = &["RowMajor", "TtoBLtoR", "Random"];
pub const SONIFICATIONS: &[&str] = &["SineColor", "AudioScrubber"];

/// Look up a traversal by name.
pub fn traversal(name: &str, seed: Option<u64>) -> Result<Box<dyn Traverse>, ConfigError> {
    match name {
        "RowMajor" | "TtoBLtoR" => Ok(Box::new(RowMajor)),
        "Random" => Ok(Box::new(match seed {
            Some(seed) => Random::with_seed(seed),
            None => Random::new(),
        })),
        _ => Err(ConfigError::UnknownTraversal(name.to_string())),
    }
}

/// Whether the named sonification needs a decoded audio source.
pub fn needs_audio(sonification: &str) -> bool {
    sonification == "AudioScrubber"
}

/// Build a full strategy. `audio` is only consulted by sonifications that
/// play back a source file.
pub fn strategy(
    traversal_name: &str,
    sonification: &str,
    seed: Option<u64>,
    audio: Option<Arc<dyn AudioSource>>,
) -> Result<Arc<dyn Strategy>, ConfigError> {
    let traversal = traversal(traversal_name, seed)?;
    match sonification {
        "SineColor" => Ok(pair(traversal, SineColor::new())),
        "AudioScrubber" => {
            let source = audio.ok_or(ConfigError::MissingAudioSource)?;
            Ok(pair(traversal, AudioScrubber::new(source)))
        }
        _ => Err(ConfigError::UnknownSonification(sonification.to_string())),
    }
}

fn pair<S: Sonify + 'static>(traversal: Box<dyn Traverse>, sonification: S) -> Arc<dyn Strategy> {
    Arc::new(PixelSound::new(traversal, sonification))
}

/// Decode the audio file for a sonification that needs one.
pub fn load_source(path: &Path) -> Result<Arc<dyn AudioSource>, ConfigError> {
    let buffer = px_formats::load_audio(path)?;
    Ok(Arc::new(buffer))
}
