//! The player state machine.
//!
//! Producers (the caller, input handlers, the continuation worker) take
//! the producer lock to run strategies and then the render lock for the
//! short queue edit. The render callback only ever takes the render lock,
//! so the lock order is always producer, then render.
//!
//! Autoplay is driven by cues: every traversal fragment is preceded in the
//! queue by a zero-length [`Callback`] that reports, from the render
//! thread, that the fragment has started. The cue is handled off the
//! render thread (by the worker, or by [`Player::pump`]), which publishes
//! the point and keeps `lookahead` fragments queued ahead of the one
//! playing. Each cue is handled by a loop iteration, never by recursion,
//! so traversal length does not grow the stack.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use px_ir::{Frame, PixelSource, Point, Rect};
use ringbuf::traits::{Consumer, Observer, Producer as _, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::config::{Drive, PlayerConfig};
use crate::error::PlayerError;
use crate::mixer::{lock_mixer, Mixer, SharedMixer, Transport};
use crate::priority_lock::PriorityLock;
use crate::queue::Retired;
use crate::strategy::{CarriedState, Strategy};
use crate::unit::BoxedUnit;
use crate::units::Callback;

/// Pending cues between the render thread and the continuation handler.
const CUE_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// Image or strategy missing.
    Idle,
    /// Ready, no autonomous traversal running.
    Armed,
    Autoplaying,
    /// Playing externally triggered pixels.
    Triggered,
}

/// Traversal position: the most recently chosen pixel and the bounds it
/// was chosen in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub point: Point,
    pub bounds: Rect,
}

enum Cue {
    Started { generation: u64, seq: u64, point: Point },
    Shutdown,
}

/// Ordered point events. Points that arrive while the backlog is full are
/// dropped and counted by [`Player::dropped_points`].
pub struct PointReceiver {
    cons: HeapCons<Point>,
}

impl PointReceiver {
    pub fn try_recv(&mut self) -> Option<Point> {
        self.cons.try_pop()
    }

    /// Everything received so far, oldest first.
    pub fn drain(&mut self) -> Vec<Point> {
        self.cons.pop_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.cons.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.cons.is_empty()
    }
}

/// Read handle for the freshest published point.
///
/// Reads go through the high-priority side of the lock, so a redraw loop
/// polling this is served ahead of queued writers.
#[derive(Clone)]
pub struct LatestPoint {
    cell: Arc<PriorityLock<Option<Point>>>,
}

impl LatestPoint {
    pub fn get(&self) -> Option<Point> {
        *self.cell.lock_high()
    }
}

struct Producer {
    image: Option<Arc<dyn PixelSource>>,
    strategy: Option<Arc<dyn Strategy>>,
    carried: Option<CarriedState>,
    cursor: Cursor,
    state: PlayerState,
    /// Bumped whenever autoplay is started or abandoned; cues from older
    /// generations are ignored.
    generation: u64,
    /// Sequence number of the last queued traversal fragment.
    enqueued: u64,
    traversal_done: bool,
    points: Option<HeapProd<Point>>,
}

impl Producer {
    fn ready(&self) -> Result<(Arc<dyn PixelSource>, Arc<dyn Strategy>), PlayerError> {
        let image = self.image.clone().ok_or(PlayerError::NoImage)?;
        let strategy = self.strategy.clone().ok_or(PlayerError::NoStrategy)?;
        Ok((image, strategy))
    }

    fn sonify(
        &mut self,
        strategy: &dyn Strategy,
        image: &dyn PixelSource,
        point: Point,
        sample_rate: u32,
    ) -> BoxedUnit {
        let color = image.color_at(point);
        let (unit, state) = strategy.sonify(color, sample_rate, self.carried.take());
        self.carried = Some(state);
        unit
    }

    fn rest_state(&self) -> PlayerState {
        if self.image.is_some() && self.strategy.is_some() {
            PlayerState::Armed
        } else {
            PlayerState::Idle
        }
    }
}

struct Shared {
    config: PlayerConfig,
    mixer: SharedMixer,
    producer: Mutex<Producer>,
    latest: Option<Arc<PriorityLock<Option<Point>>>>,
    cue_tx: Sender<Cue>,
    cue_rx: Receiver<Cue>,
    dropped_points: AtomicU64,
}

impl Shared {
    fn producer(&self) -> MutexGuard<'_, Producer> {
        self.producer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue edit under the render lock. Whatever comes off the queue is
    /// returned so it can be freed after the lock is released.
    fn edit_queue(&self, clear: bool, units: impl IntoIterator<Item = BoxedUnit>) -> Retired {
        let mut mixer = lock_mixer(&self.mixer);
        let retired = if clear {
            mixer.queue.clear()
        } else {
            mixer.queue.take_retired()
        };
        for unit in units {
            mixer.queue.add(unit);
        }
        retired
    }

    fn cue(&self, generation: u64, seq: u64, point: Point) -> BoxedUnit {
        let tx = self.cue_tx.clone();
        Box::new(Callback::new(move || {
            // A full cue channel stalls the traversal; the render thread
            // must not wait for room.
            let _ = tx.try_send(Cue::Started {
                generation,
                seq,
                point,
            });
        }))
    }

    fn publish(&self, p: &mut Producer, point: Point) {
        if let Some(prod) = p.points.as_mut() {
            if prod.try_push(point).is_err() {
                let dropped = self.dropped_points.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    log::warn!("point channel full, {dropped} events dropped so far");
                }
            }
        }
        if let Some(latest) = &self.latest {
            *latest.lock() = Some(point);
        }
    }

    /// Queue traversal fragments until `lookahead` of them are waiting
    /// behind fragment `playing`, or the traversal ends.
    fn top_up(&self, p: &mut Producer, playing: u64) -> Retired {
        let Ok((image, strategy)) = p.ready() else {
            return Retired::default();
        };
        let lookahead = self.config.lookahead.max(1) as u64;
        let mut batch = Vec::new();
        while !p.traversal_done && p.enqueued - playing < lookahead {
            p.cursor.bounds = image.bounds();
            let (next, more) = strategy.traverse(p.cursor.point, p.cursor.bounds);
            p.cursor.point = next;
            p.traversal_done = !more;
            p.enqueued += 1;
            let unit = p.sonify(&*strategy, &*image, next, self.config.sample_rate);
            batch.push(self.cue(p.generation, p.enqueued, next));
            batch.push(unit);
        }
        if batch.is_empty() {
            return Retired::default();
        }
        self.edit_queue(false, batch)
    }

    fn handle(&self, cue: Cue) -> bool {
        let Cue::Started {
            generation,
            seq,
            point,
        } = cue
        else {
            return false;
        };
        let retired = {
            let mut p = self.producer();
            if p.generation != generation {
                return true;
            }
            self.publish(&mut p, point);
            let retired = self.top_up(&mut p, seq);
            if p.traversal_done && seq == p.enqueued {
                log::debug!("traversal finished at {point} after {} fragments", seq + 1);
                p.state = p.rest_state();
            }
            retired
        };
        drop(retired);
        true
    }
}

fn worker(shared: Arc<Shared>) {
    log::debug!("player worker started");
    while let Ok(cue) = shared.cue_rx.recv() {
        if !shared.handle(cue) {
            break;
        }
    }
    log::debug!("player worker stopped");
}

/// Drives sonification of an image into the playback queue.
///
/// All methods take `&self`; a player can be shared across producer
/// threads behind an `Arc`.
pub struct Player {
    shared: Arc<Shared>,
    /// Behind a mutex so the player stays `Sync`; the receiver is not.
    points: Mutex<Option<PointReceiver>>,
    worker: Option<JoinHandle<()>>,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_mixer(config, Mixer::shared())
    }

    /// Build a player around an existing render lock.
    pub fn with_mixer(config: PlayerConfig, mixer: SharedMixer) -> Self {
        let (prod, points) = if config.publishing.channel() {
            let (prod, cons) = HeapRb::<Point>::new(config.channel_capacity.max(1)).split();
            (Some(prod), Some(PointReceiver { cons }))
        } else {
            (None, None)
        };
        let latest = config
            .publishing
            .latest()
            .then(|| Arc::new(PriorityLock::new(None)));
        let (cue_tx, cue_rx) = crossbeam_channel::bounded(CUE_CAPACITY);

        let shared = Arc::new(Shared {
            mixer,
            producer: Mutex::new(Producer {
                image: None,
                strategy: None,
                carried: None,
                cursor: Cursor::default(),
                state: PlayerState::Idle,
                generation: 0,
                enqueued: 0,
                traversal_done: true,
                points: prod,
            }),
            latest,
            cue_tx,
            cue_rx,
            dropped_points: AtomicU64::new(0),
            config,
        });

        let worker = match shared.config.drive {
            Drive::Threaded => {
                let shared = shared.clone();
                Some(std::thread::spawn(move || worker(shared)))
            }
            Drive::Manual => None,
        };

        log::debug!(
            "player ready: {} Hz, publishing {:?}, {:?} drive",
            shared.config.sample_rate,
            shared.config.publishing,
            shared.config.drive
        );

        Self {
            shared,
            points: Mutex::new(points),
            worker,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// The render lock. Hand this to the output subsystem.
    pub fn mixer(&self) -> SharedMixer {
        self.shared.mixer.clone()
    }

    pub fn state(&self) -> PlayerState {
        self.shared.producer().state
    }

    pub fn cursor(&self) -> Cursor {
        self.shared.producer().cursor
    }

    /// The ordered point channel. Available once, and only when the
    /// player was built to publish through a channel.
    pub fn take_point_receiver(&mut self) -> Option<PointReceiver> {
        self.points.get_mut().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn latest_point(&self) -> Option<LatestPoint> {
        self.shared.latest.clone().map(|cell| LatestPoint { cell })
    }

    /// Point events lost to a full channel.
    pub fn dropped_points(&self) -> u64 {
        self.shared.dropped_points.load(Ordering::Relaxed)
    }

    /// Replace the image. A running traversal picks up the new image from
    /// its next unqueued fragment; call [`stop`](Self::stop) first to avoid
    /// mixing the two.
    pub fn set_image(&self, image: Arc<dyn PixelSource>) {
        let mut p = self.shared.producer();
        log::debug!("image set: {:?}", image.bounds());
        p.image = Some(image);
        if p.state == PlayerState::Idle {
            p.state = p.rest_state();
        }
    }

    /// Replace the strategy and discard the carried sonification state.
    pub fn set_strategy(&self, strategy: Arc<dyn Strategy>) {
        let mut p = self.shared.producer();
        p.strategy = Some(strategy);
        p.carried = None;
        if p.state == PlayerState::Idle {
            p.state = p.rest_state();
        }
    }

    /// Start autoplay from `start`, discarding anything queued. `start`
    /// must lie inside the image.
    pub fn play(&self, start: Point) -> Result<(), PlayerError> {
        let (first, more) = {
            let mut p = self.shared.producer();
            let (image, strategy) = p.ready()?;
            let bounds = image.bounds();
            if !bounds.contains(start) {
                return Err(PlayerError::OutOfBounds {
                    point: start,
                    bounds,
                });
            }
            p.generation += 1;
            p.enqueued = 0;
            p.traversal_done = false;
            p.cursor = Cursor {
                point: start,
                bounds: image.bounds(),
            };
            let unit = p.sonify(&*strategy, &*image, start, self.shared.config.sample_rate);
            let cue = self.shared.cue(p.generation, 0, start);
            let first = self.shared.edit_queue(true, [cue, unit]);
            p.state = PlayerState::Autoplaying;
            let more = self.shared.top_up(&mut p, 0);
            log::info!("autoplay from {start} in {:?}", p.cursor.bounds);
            (first, more)
        };
        drop(first);
        drop(more);
        Ok(())
    }

    /// Sound a single pixel now. With `queue` the fragment plays after
    /// whatever is queued; without it everything queued is discarded.
    ///
    /// Ends any autoplay in progress: fragments it already queued still
    /// play when `queue` is set, but the traversal does not advance.
    pub fn play_pixel(&self, point: Point, queue: bool) -> Result<(), PlayerError> {
        let retired = {
            let mut p = self.shared.producer();
            let (image, strategy) = p.ready()?;
            p.generation += 1;
            p.traversal_done = true;
            p.cursor = Cursor {
                point,
                bounds: image.bounds(),
            };
            self.shared.publish(&mut p, point);
            let unit = p.sonify(&*strategy, &*image, point, self.shared.config.sample_rate);
            let retired = self.shared.edit_queue(!queue, [unit]);
            p.state = PlayerState::Triggered;
            retired
        };
        drop(retired);
        Ok(())
    }

    /// Discard everything queued and end autoplay.
    pub fn stop(&self) {
        let retired = {
            let mut p = self.shared.producer();
            p.generation += 1;
            p.traversal_done = true;
            let retired = self.shared.edit_queue(true, std::iter::empty());
            p.state = p.rest_state();
            retired
        };
        drop(retired);
    }

    /// Handle pending continuation cues on the calling thread. Returns the
    /// number handled. Only meaningful with [`Drive::Manual`].
    pub fn pump(&self) -> usize {
        if self.shared.config.drive != Drive::Manual {
            return 0;
        }
        let mut handled = 0;
        while let Ok(cue) = self.shared.cue_rx.try_recv() {
            self.shared.handle(cue);
            handled += 1;
        }
        handled
    }

    /// Render straight from the queue, for use without an output
    /// subsystem.
    pub fn render(&self, out: &mut [Frame]) {
        let retired = {
            let mut mixer = lock_mixer(&self.shared.mixer);
            mixer.render(out);
            mixer.queue.take_retired()
        };
        drop(retired);
    }

    /// Units waiting in the queue, including the one playing.
    pub fn queued(&self) -> usize {
        lock_mixer(&self.shared.mixer).queue.len()
    }

    // --- Transport ---

    pub fn transport(&self) -> Transport {
        lock_mixer(&self.shared.mixer).transport
    }

    pub fn pause(&self) {
        lock_mixer(&self.shared.mixer).transport.set_paused(true);
    }

    pub fn resume(&self) {
        lock_mixer(&self.shared.mixer).transport.set_paused(false);
    }

    /// Returns whether playback is now paused.
    pub fn toggle_playback(&self) -> bool {
        let mut mixer = lock_mixer(&self.shared.mixer);
        let paused = !mixer.transport.paused();
        mixer.transport.set_paused(paused);
        paused
    }

    pub fn mute(&self) {
        lock_mixer(&self.shared.mixer).transport.set_muted(true);
    }

    pub fn unmute(&self) {
        lock_mixer(&self.shared.mixer).transport.set_muted(false);
    }

    /// Returns whether output is now muted.
    pub fn toggle_mute(&self) -> bool {
        let mut mixer = lock_mixer(&self.shared.mixer);
        let muted = !mixer.transport.muted();
        mixer.transport.set_muted(muted);
        muted
    }

    /// Set the base-2 volume exponent: 0 is unity gain, -1 halves it.
    pub fn set_volume(&self, volume: f64) {
        lock_mixer(&self.shared.mixer).transport.set_volume(volume);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.worker.take() {
            let _ = self.shared.cue_tx.send(Cue::Shutdown);
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointPublishing;
    use crate::strategy::{PixelSound, Sonify};
    use crate::traversal::RowMajor;
    use crate::unit::{AudioUnit, Fill};
    use crate::units::Take;
    use px_ir::{Color, PixelGrid};

    /// Constant output at `r / 255`.
    struct Level(f32);

    impl AudioUnit for Level {
        fn stream(&mut self, out: &mut [Frame]) -> Fill {
            out.fill(Frame::mono(self.0));
            Fill::more(out.len())
        }
    }

    struct Levels(usize);

    impl Sonify for Levels {
        type State = usize;

        fn sonify(&self, color: Color, _: u32, prior: Option<usize>) -> (BoxedUnit, usize) {
            let level = color.r as f32 / 255.0;
            (Box::new(Take::new(Level(level), self.0)), prior.unwrap_or(0) + 1)
        }
    }

    fn manual(publishing: PointPublishing) -> Player {
        Player::new(PlayerConfig {
            sample_rate: 8000,
            publishing,
            drive: Drive::Manual,
            ..PlayerConfig::default()
        })
    }

    fn ready(player: &Player, w: u32, h: u32) {
        let image = PixelGrid::from_fn(w, h, |p| Color::rgb((p.y * w as i32 + p.x) as u8 + 1, 0, 0));
        player.set_image(Arc::new(image));
        player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels(4))));
    }

    #[test]
    fn player_can_be_shared_between_threads() {
        fn shareable<T: Send + Sync>() {}
        shareable::<Player>();
        shareable::<LatestPoint>();
    }

    #[test]
    fn idle_until_image_and_strategy() {
        let player = manual(PointPublishing::None);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.play(Point::ORIGIN), Err(PlayerError::NoImage));

        player.set_image(Arc::new(PixelGrid::filled(2, 2, Color::BLACK)));
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.play_pixel(Point::ORIGIN, false), Err(PlayerError::NoStrategy));

        player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels(4))));
        assert_eq!(player.state(), PlayerState::Armed);
    }

    #[test]
    fn play_rejects_a_start_outside_the_image() {
        let player = manual(PointPublishing::None);
        ready(&player, 3, 2);
        player.play_pixel(Point::new(1, 1), false).unwrap();

        let err = player.play(Point::new(0, 99)).unwrap_err();
        assert_eq!(
            err,
            PlayerError::OutOfBounds {
                point: Point::new(0, 99),
                bounds: Rect::from_size(3, 2)
            }
        );
        // Nothing already queued is disturbed.
        assert_eq!(player.state(), PlayerState::Triggered);
        assert_eq!(player.queued(), 1);
    }

    #[test]
    fn autoplay_walks_the_image_and_returns_to_armed() {
        let mut player = manual(PointPublishing::Both);
        let mut rx = player.take_point_receiver().unwrap();
        let latest = player.latest_point().unwrap();
        ready(&player, 3, 2);

        player.play(Point::ORIGIN).unwrap();
        assert_eq!(player.state(), PlayerState::Autoplaying);

        let mut out = vec![Frame::silence(); 2];
        let mut levels = Vec::new();
        for _ in 0..20 {
            player.pump();
            player.render(&mut out);
            levels.extend(out.iter().map(|f| (f.left * 255.0).round() as u8));
        }
        player.pump();

        let points: Vec<_> = rx.drain().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(points, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(latest.get(), Some(Point::new(2, 1)));
        assert_eq!(player.state(), PlayerState::Armed);

        let mut expected: Vec<u8> = (1..=6).flat_map(|l| [l; 4]).collect();
        expected.resize(40, 0);
        assert_eq!(levels, expected);
    }

    #[test]
    fn stop_silences_and_ignores_stale_cues() {
        let mut player = manual(PointPublishing::Channel);
        let mut rx = player.take_point_receiver().unwrap();
        ready(&player, 4, 4);

        player.play(Point::ORIGIN).unwrap();
        let mut out = vec![Frame::silence(); 2];
        player.render(&mut out);
        player.stop();
        player.pump();
        assert_eq!(player.state(), PlayerState::Armed);
        assert_eq!(player.queued(), 0);

        player.render(&mut out);
        assert!(out.iter().all(Frame::is_silent));
        player.pump();
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn play_pixel_publishes_immediately() {
        let mut player = manual(PointPublishing::Channel);
        let mut rx = player.take_point_receiver().unwrap();
        ready(&player, 4, 4);

        player.play_pixel(Point::new(2, 3), true).unwrap();
        player.play_pixel(Point::new(1, 1), true).unwrap();
        assert_eq!(player.state(), PlayerState::Triggered);
        assert_eq!(rx.drain(), vec![Point::new(2, 3), Point::new(1, 1)]);
        assert_eq!(player.queued(), 2);
        assert_eq!(player.cursor().point, Point::new(1, 1));
    }

    #[test]
    fn set_strategy_discards_carried_state() {
        let player = manual(PointPublishing::None);
        ready(&player, 2, 2);
        player.play_pixel(Point::ORIGIN, true).unwrap();
        player.play_pixel(Point::ORIGIN, true).unwrap();
        let count = |p: &Player| {
            p.shared
                .producer()
                .carried
                .as_ref()
                .and_then(|s| s.downcast_ref::<usize>().copied())
        };
        assert_eq!(count(&player), Some(2));
        player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels(4))));
        assert_eq!(count(&player), None);
        player.play_pixel(Point::ORIGIN, true).unwrap();
        assert_eq!(count(&player), Some(1));
    }

    #[test]
    fn transport_controls() {
        let player = manual(PointPublishing::None);
        ready(&player, 2, 2);
        player.play_pixel(Point::new(1, 0), false).unwrap();

        assert!(player.toggle_playback());
        let mut out = vec![Frame::silence(); 2];
        player.render(&mut out);
        assert!(out.iter().all(Frame::is_silent));
        assert_eq!(player.queued(), 1);
        player.resume();

        player.set_volume(-1.0);
        player.render(&mut out);
        assert!((out[0].left - 1.0 / 255.0).abs() < 1e-6);

        assert!(player.toggle_mute());
        player.render(&mut out);
        assert!(out.iter().all(Frame::is_silent));
        player.unmute();
        assert!(!player.transport().muted());
    }

    #[test]
    fn threaded_worker_drives_autoplay() {
        let mut player = Player::new(PlayerConfig {
            sample_rate: 8000,
            publishing: PointPublishing::Channel,
            ..PlayerConfig::default()
        });
        let mut rx = player.take_point_receiver().unwrap();
        ready(&player, 2, 2);
        player.play(Point::ORIGIN).unwrap();

        let mut out = vec![Frame::silence(); 1];
        let mut seen = Vec::new();
        for _ in 0..2000 {
            player.render(&mut out);
            std::thread::sleep(std::time::Duration::from_micros(200));
            seen.extend(rx.drain());
            if seen.len() == 4 {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(0, 1), Point::new(1, 1)]
        );
    }
}
