use px_ir::{Point, Rect};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    #[error("no image set")]
    NoImage,
    #[error("no strategy set")]
    NoStrategy,
    #[error("start point {point} is outside the image {bounds:?}")]
    OutOfBounds { point: Point, bounds: Rect },
}
