//! End-to-end playback behaviour through the public API.

use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use px_engine::sonification::SineColor;
use px_engine::traversal::RowMajor;
use px_engine::units::Take;
use px_engine::{
    AudioUnit, BoxedUnit, Drive, Fill, PixelSound, Player, PlayerConfig, PlayerState,
    PointPublishing, Sonify,
};
use px_ir::{Color, Frame, PixelGrid, Point};
use px_master::{AudioOutput, NullOutput};

/// Constant output.
struct Level(f32);

impl AudioUnit for Level {
    fn stream(&mut self, out: &mut [Frame]) -> Fill {
        out.fill(Frame::mono(self.0));
        Fill::more(out.len())
    }
}

/// Each pixel becomes `frames` frames at level `r / 255`.
struct Levels {
    frames: usize,
}

impl Sonify for Levels {
    type State = ();

    fn sonify(&self, color: Color, _: u32, _: Option<()>) -> (BoxedUnit, ()) {
        (Box::new(Take::new(Level(color.r as f32 / 255.0), self.frames)), ())
    }
}

fn level_of(frame: &Frame) -> u8 {
    (frame.left * 255.0).round() as u8
}

/// Pixel (x, y) has red = 1 + x + y * width, wrapping past 255.
fn numbered(width: u32, height: u32) -> Arc<PixelGrid> {
    Arc::new(PixelGrid::from_fn(width, height, |p| {
        let n = (p.x + p.y * width as i32) as u8;
        Color::rgb(n.wrapping_add(1), 0, 0)
    }))
}

fn manual(publishing: PointPublishing, capacity: usize) -> Player {
    Player::new(PlayerConfig {
        sample_rate: 8000,
        publishing,
        channel_capacity: capacity,
        drive: Drive::Manual,
        ..PlayerConfig::default()
    })
}

fn render_until_finished(player: &Player, block: usize, limit: usize) -> Vec<Frame> {
    let mut out = Vec::new();
    let mut buf = vec![Frame::silence(); block];
    while out.len() < limit {
        player.pump();
        if player.state() != PlayerState::Autoplaying && player.queued() == 0 {
            break;
        }
        player.render(&mut buf);
        out.extend_from_slice(&buf);
    }
    out
}

#[test]
fn row_major_autoplay_is_gapless_and_ordered() {
    let mut player = manual(PointPublishing::Channel, 60);
    let mut points = player.take_point_receiver().unwrap();
    player.set_image(numbered(3, 2));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 5 })));
    player.play(Point::ORIGIN).unwrap();

    let out = render_until_finished(&player, 3, 1000);
    let levels: Vec<u8> = out.iter().map(level_of).collect();
    let expected: Vec<u8> = (1..=6).flat_map(|l| [l; 5]).collect();
    assert_eq!(&levels[..30], &expected[..]);
    assert!(levels[30..].iter().all(|&l| l == 0));

    let visited: Vec<(i32, i32)> = points.drain().iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(visited, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    assert_eq!(player.state(), PlayerState::Armed);
}

#[test]
fn non_queued_trigger_preempts_traversal() {
    let player = manual(PointPublishing::None, 60);
    player.set_image(numbered(8, 8));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 10 })));
    player.play(Point::ORIGIN).unwrap();

    let mut buf = vec![Frame::silence(); 4];
    for _ in 0..3 {
        player.pump();
        player.render(&mut buf);
    }
    assert!(player.queued() > 1);

    // Pixel (7, 7) has level 64.
    player.play_pixel(Point::new(7, 7), false).unwrap();
    assert_eq!(player.queued(), 1);
    assert_eq!(player.state(), PlayerState::Triggered);

    let mut out = Vec::new();
    for _ in 0..10 {
        player.pump();
        player.render(&mut buf);
        out.extend(buf.iter().map(level_of));
    }
    assert_eq!(&out[..10], &[64u8; 10][..]);
    assert!(out[10..].iter().all(|&l| l == 0), "{out:?}");
}

#[test]
fn queued_triggers_append_after_current_fragment() {
    let player = manual(PointPublishing::None, 60);
    player.set_image(numbered(4, 1));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 2 })));

    player.play_pixel(Point::new(0, 0), false).unwrap();
    player.play_pixel(Point::new(3, 0), true).unwrap();
    player.play_pixel(Point::new(1, 0), true).unwrap();

    let mut buf = vec![Frame::silence(); 8];
    player.render(&mut buf);
    let levels: Vec<u8> = buf.iter().map(level_of).collect();
    assert_eq!(levels, vec![1, 1, 4, 4, 2, 2, 0, 0]);
}

#[test]
fn stop_discards_everything_queued() {
    let player = manual(PointPublishing::Latest, 60);
    let latest = player.latest_point().unwrap();
    player.set_image(numbered(4, 4));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 10 })));
    player.play(Point::ORIGIN).unwrap();

    let mut buf = vec![Frame::silence(); 4];
    player.render(&mut buf);
    player.pump();
    assert_eq!(latest.get(), Some(Point::ORIGIN));

    player.stop();
    assert_eq!(player.state(), PlayerState::Armed);
    for _ in 0..10 {
        player.pump();
        player.render(&mut buf);
        assert!(buf.iter().all(Frame::is_silent));
    }
    assert_eq!(latest.get(), Some(Point::ORIGIN));
}

#[test]
fn concurrent_triggers_are_each_serialized() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let mut player = manual(PointPublishing::Channel, THREADS * PER_THREAD);
    let mut points = player.take_point_receiver().unwrap();
    player.set_image(numbered(16, 16));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 1 })));
    let player = Arc::new(player);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let player = player.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    player.play_pixel(Point::new(t as i32, i as i32 % 16), true).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(player.queued(), THREADS * PER_THREAD);
    assert_eq!(player.dropped_points(), 0);
    let received = points.drain();
    assert_eq!(received.len(), THREADS * PER_THREAD);
    // Each producer's points arrive in the order it triggered them.
    for t in 0..THREADS as i32 {
        let ys: Vec<i32> = received.iter().filter(|p| p.x == t).map(|p| p.y).collect();
        let expected: Vec<i32> = (0..PER_THREAD as i32).map(|i| i % 16).collect();
        assert_eq!(ys, expected);
    }
}

#[test]
fn full_point_channel_drops_newest_and_counts() {
    let mut player = manual(PointPublishing::Channel, 4);
    let mut points = player.take_point_receiver().unwrap();
    player.set_image(numbered(10, 1));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 1 })));

    for x in 0..10 {
        player.play_pixel(Point::new(x, 0), true).unwrap();
    }
    assert_eq!(player.dropped_points(), 6);
    let xs: Vec<i32> = points.drain().iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0, 1, 2, 3]);
    // Audio is unaffected by dropped events.
    assert_eq!(player.queued(), 10);

    player.play_pixel(Point::new(9, 0), true).unwrap();
    assert_eq!(points.try_recv(), Some(Point::new(9, 0)));
}

#[test]
fn sine_color_renders_reproducibly() {
    let render = || {
        let player = manual(PointPublishing::None, 60);
        player.set_image(Arc::new(PixelGrid::from_fn(5, 3, |p| {
            Color::rgb(p.x as u8 * 50, p.y as u8 * 100, 0)
        })));
        player.set_strategy(Arc::new(PixelSound::new(RowMajor, SineColor::new())));
        player.play(Point::ORIGIN).unwrap();
        render_until_finished(&player, 32, 1 << 20)
    };
    let a = render();
    let b = render();
    let expected: u64 = (0..3)
        .flat_map(|y| (0..5).map(move |x| Color::rgb(x * 50, y * 100, 0)))
        .map(|c| SineColor::fragment_frames(c, 8000))
        .sum();
    assert!(a.len() as u64 >= expected);
    assert!(a.len() as u64 <= expected + 64);
    assert_eq!(a.len(), b.len());
    assert!(a.iter().zip(&b).all(|(x, y)| x.left.to_bits() == y.left.to_bits()));
}

#[test]
fn threaded_player_runs_against_null_output() {
    let mut player = Player::new(PlayerConfig {
        sample_rate: 8000,
        publishing: PointPublishing::Both,
        ..PlayerConfig::default()
    });
    let mut points = player.take_point_receiver().unwrap();
    player.set_image(numbered(3, 3));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, Levels { frames: 40 })));

    let mut output = NullOutput::new(8000, 32);
    output.start(player.mixer()).unwrap();
    player.play(Point::ORIGIN).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while (player.state() == PlayerState::Autoplaying || player.queued() > 0)
        && Instant::now() < deadline
    {
        std::thread::sleep(Duration::from_millis(5));
    }
    output.stop().unwrap();

    assert_eq!(player.state(), PlayerState::Armed);
    let visited = points.drain();
    assert_eq!(visited.len(), 9);
    assert_eq!(visited.last(), Some(&Point::new(2, 2)));
    assert_eq!(player.latest_point().unwrap().get(), Some(Point::new(2, 2)));
}
