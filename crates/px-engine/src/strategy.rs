//! Traversal and sonification contracts.

use std::any::Any;
use std::fmt;

use px_ir::{Color, Point, Rect};

use crate::unit::BoxedUnit;

/// Chooses the next pixel to play.
///
/// Must never return a point outside `bounds` while signalling `more`.
/// A returned `more = false` marks the final point of the run; that point
/// is still sonified by the caller.
pub trait Traverse: Send + Sync {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool);
}

impl<T: Traverse + ?Sized> Traverse for Box<T> {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool) {
        (**self).traverse(prev, bounds)
    }
}

/// Maps a pixel color to a sound fragment, threading state between calls.
///
/// `prior` is `None` on the first call after the strategy is installed.
/// Calls must stay cheap: expensive setup belongs in the constructor.
pub trait Sonify: Send + Sync {
    type State: Send + 'static;

    fn sonify(
        &self,
        color: Color,
        sample_rate: u32,
        prior: Option<Self::State>,
    ) -> (BoxedUnit, Self::State);
}

/// State carried from one sonification call to the next.
///
/// The player stores and forwards it without looking inside; only the
/// strategy that produced it knows its type.
pub struct CarriedState(Box<dyn Any + Send>);

impl CarriedState {
    pub fn new<S: Send + 'static>(state: S) -> Self {
        Self(Box::new(state))
    }

    pub fn downcast_ref<S: 'static>(&self) -> Option<&S> {
        self.0.downcast_ref()
    }

    fn into_inner<S: 'static>(self) -> Option<S> {
        self.0.downcast::<S>().ok().map(|b| *b)
    }
}

impl fmt::Debug for CarriedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CarriedState(..)")
    }
}

/// A complete playback strategy, object-safe so the player can swap it at
/// runtime.
pub trait Strategy: Send + Sync {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool);

    fn sonify(
        &self,
        color: Color,
        sample_rate: u32,
        prior: Option<CarriedState>,
    ) -> (BoxedUnit, CarriedState);
}

/// Pairs a traversal with a sonification.
pub struct PixelSound<T, S> {
    pub traversal: T,
    pub sonification: S,
}

impl<T: Traverse, S: Sonify> PixelSound<T, S> {
    pub fn new(traversal: T, sonification: S) -> Self {
        Self {
            traversal,
            sonification,
        }
    }
}

impl<T: Traverse, S: Sonify> Strategy for PixelSound<T, S> {
    fn traverse(&self, prev: Point, bounds: Rect) -> (Point, bool) {
        self.traversal.traverse(prev, bounds)
    }

    fn sonify(
        &self,
        color: Color,
        sample_rate: u32,
        prior: Option<CarriedState>,
    ) -> (BoxedUnit, CarriedState) {
        // State from another strategy reads as a fresh start.
        let prior = prior.and_then(CarriedState::into_inner::<S::State>);
        let (unit, state) = self.sonification.sonify(color, sample_rate, prior);
        (unit, CarriedState::new(state))
    }
}
