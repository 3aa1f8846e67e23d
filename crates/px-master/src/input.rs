//! Input listeners and the keyboard cursor.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};

use px_engine::{Player, PlayerError};
use px_ir::{Point, Rect};
use slotmap::{new_key_type, SlotMap};

/// Wait before a held key starts repeating.
pub const REPEAT_DELAY: Duration = Duration::from_millis(400);
/// Interval between repeats once repeating.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub const ALL: [Key; 4] = [Key::Up, Key::Down, Key::Left, Key::Right];

    fn index(self) -> usize {
        self as usize
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Key::Up => (0, -1),
            Key::Down => (0, 1),
            Key::Left => (-1, 0),
            Key::Right => (1, 0),
        }
    }
}

impl FromStr for Key {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" | "k" => Ok(Key::Up),
            "down" | "s" | "j" => Ok(Key::Down),
            "left" | "a" | "h" => Ok(Key::Left),
            "right" | "d" | "l" => Ok(Key::Right),
            _ => Err(()),
        }
    }
}

new_key_type! {
    struct ListenerKey;
}

type PointerFn = Box<dyn Fn(Point) + Send + Sync>;
type KeyFn = Box<dyn Fn(Key) + Send + Sync>;

enum Listener {
    Pointer(PointerFn),
    Key(Key, KeyFn),
}

type Listeners = RwLock<SlotMap<ListenerKey, Listener>>;

/// Registered pointer-move and key-press callbacks.
///
/// Callbacks run on the dispatching thread while the registry is
/// read-locked, so they must not register or cancel listeners themselves.
/// Cancelling waits for any dispatch in progress; once it returns, the
/// listener is never called again.
#[derive(Clone, Default)]
pub struct InputRegistry {
    listeners: Arc<Listeners>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer_move(&self, f: impl Fn(Point) + Send + Sync + 'static) -> Subscription {
        self.insert(Listener::Pointer(Box::new(f)))
    }

    pub fn on_key_press(&self, key: Key, f: impl Fn(Key) + Send + Sync + 'static) -> Subscription {
        self.insert(Listener::Key(key, Box::new(f)))
    }

    /// Call every pointer listener. Returns how many ran.
    pub fn dispatch_pointer(&self, point: Point) -> usize {
        let listeners = self.read();
        let mut called = 0;
        for listener in listeners.values() {
            if let Listener::Pointer(f) = listener {
                f(point);
                called += 1;
            }
        }
        called
    }

    /// Call every listener bound to `key`. Returns how many ran.
    pub fn dispatch_key(&self, key: Key) -> usize {
        let listeners = self.read();
        let mut called = 0;
        for listener in listeners.values() {
            if let Listener::Key(k, f) = listener {
                if *k == key {
                    f(key);
                    called += 1;
                }
            }
        }
        called
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn insert(&self, listener: Listener) -> Subscription {
        let key = write(&self.listeners).insert(listener);
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            key: Some(key),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SlotMap<ListenerKey, Listener>> {
        self.listeners.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn write(listeners: &Listeners) -> RwLockWriteGuard<'_, SlotMap<ListenerKey, Listener>> {
    listeners.write().unwrap_or_else(|e| e.into_inner())
}

/// Keeps a listener registered. Dropping it unregisters the listener.
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct Subscription {
    listeners: Weak<Listeners>,
    key: Option<ListenerKey>,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let (Some(key), Some(listeners)) = (self.key.take(), self.listeners.upgrade()) {
            write(&listeners).remove(key);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Press-and-hold repeat timing for one key.
#[derive(Clone, Debug)]
pub struct KeyRepeat {
    delay: Duration,
    interval: Duration,
    last_fired: Option<Instant>,
    repeating: bool,
}

impl KeyRepeat {
    pub fn new(delay: Duration, interval: Duration) -> Self {
        Self {
            delay,
            interval,
            last_fired: None,
            repeating: false,
        }
    }

    /// The key went down. Always fires.
    pub fn press(&mut self, now: Instant) -> bool {
        self.last_fired = Some(now);
        self.repeating = false;
        true
    }

    /// The key is still down at `now`. Returns whether to fire again.
    pub fn hold(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_fired else {
            return false;
        };
        let wait = if self.repeating { self.interval } else { self.delay };
        if now.saturating_duration_since(last) > wait {
            self.repeating = true;
            self.last_fired = Some(now);
            return true;
        }
        false
    }

    pub fn release(&mut self) {
        self.last_fired = None;
        self.repeating = false;
    }
}

impl Default for KeyRepeat {
    fn default() -> Self {
        Self::new(REPEAT_DELAY, REPEAT_INTERVAL)
    }
}

/// A pixel cursor moved by arrow keys. Each move wraps around the image
/// edges and sounds the new pixel. Held keys repeat with [`KeyRepeat`]
/// timing.
pub struct KeyboardCursor {
    player: Arc<Player>,
    bounds: Rect,
    queue: bool,
    position: Mutex<Point>,
    repeat: Mutex<[KeyRepeat; 4]>,
}

impl KeyboardCursor {
    pub fn new(player: Arc<Player>, bounds: Rect, queue: bool) -> Self {
        Self {
            player,
            position: Mutex::new(bounds.min),
            bounds,
            queue,
            repeat: Mutex::new(Default::default()),
        }
    }

    pub fn position(&self) -> Point {
        *self.position.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move one pixel and play it.
    pub fn step(&self, key: Key) -> Result<Point, PlayerError> {
        let point = {
            let mut pos = self.position.lock().unwrap_or_else(|e| e.into_inner());
            let (dx, dy) = key.delta();
            *pos = self.bounds.wrap(Point::new(pos.x + dx, pos.y + dy));
            *pos
        };
        self.player.play_pixel(point, self.queue)?;
        Ok(point)
    }

    /// The key went down: step once and start its repeat clock.
    pub fn press(&self, key: Key, now: Instant) -> Result<Point, PlayerError> {
        self.repeat()[key.index()].press(now);
        self.step(key)
    }

    /// The key is still down at `now`. Steps again once the repeat delay
    /// (then the repeat interval) has passed.
    pub fn hold(&self, key: Key, now: Instant) -> Result<Option<Point>, PlayerError> {
        if self.repeat()[key.index()].hold(now) {
            self.step(key).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn release(&self, key: Key) {
        self.repeat()[key.index()].release();
    }

    fn repeat(&self) -> MutexGuard<'_, [KeyRepeat; 4]> {
        self.repeat.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register arrow-key listeners that step this cursor.
    pub fn bind(self: &Arc<Self>, registry: &InputRegistry) -> Vec<Subscription> {
        Key::ALL
            .into_iter()
            .map(|key| {
                let cursor = self.clone();
                registry.on_key_press(key, move |k| {
                    if let Err(e) = cursor.press(k, Instant::now()) {
                        log::warn!("keyboard step ignored: {e}");
                    }
                })
            })
            .collect()
    }
}

/// Play whatever pixel the pointer moves over. Points off the image are
/// ignored.
pub fn bind_pointer(
    player: Arc<Player>,
    bounds: Rect,
    queue: bool,
    registry: &InputRegistry,
) -> Subscription {
    registry.on_pointer_move(move |point| {
        if !bounds.contains(point) {
            return;
        }
        if let Err(e) = player.play_pixel(point, queue) {
            log::warn!("pointer trigger ignored: {e}");
        }
    })
}
