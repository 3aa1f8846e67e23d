//! Allocation-free render path tests.
//!
//! These verify that `Mixer::render` neither allocates nor frees while
//! units start, finish, and hand over to each other, including the cue
//! callbacks that drive autoplay.
//!
//! Runs under plain `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use px_engine::sonification::{AudioScrubber, SineColor};
use px_engine::traversal::RowMajor;
use px_engine::units::{BufferSlice, Callback, Sine, Take};
use px_engine::{lock_mixer, Drive, Mixer, PixelSound, Player, PlayerConfig, PointPublishing};
use px_ir::{AudioSource, Color, Frame, PixelGrid, Point, SampleBuffer};

fn ramp(len: usize) -> Arc<dyn AudioSource> {
    let data = (0..len).map(|i| (i as f32 / len as f32) - 0.5).collect();
    Arc::new(SampleBuffer::mono("ramp", 44100, data))
}

#[test]
fn queue_handover_is_alloc_free() {
    let mixer = Mixer::shared();
    let cues = Arc::new(AtomicUsize::new(0));
    {
        let mut m = lock_mixer(&mixer);
        for i in 0..20 {
            let c = cues.clone();
            m.queue.add(Box::new(Callback::new(move || {
                c.fetch_add(1, Ordering::Relaxed);
            })));
            m.queue.add(Box::new(Take::new(Sine::new(220.0 + i as f64, 44100, 0.0), 300 + i)));
        }
        m.queue.add(Box::new(BufferSlice::new(ramp(5000), 100, 4000).with_step(1.5)));
    }

    let mut block = vec![Frame::silence(); 256];
    let mut m = lock_mixer(&mixer);
    assert_no_alloc(|| {
        for _ in 0..100 {
            m.render(&mut block);
        }
        m.transport.set_volume(-1.0);
        m.transport.set_muted(true);
        m.render(&mut block);
        m.transport.set_paused(true);
        m.render(&mut block);
    });
    assert_eq!(cues.load(Ordering::Relaxed), 20);
    assert!(m.queue.is_empty());
    let retired = m.queue.take_retired();
    assert_eq!(retired.len(), 41);
}

#[test]
fn autoplay_render_is_alloc_free() {
    let player = Player::new(PlayerConfig {
        publishing: PointPublishing::Both,
        drive: Drive::Manual,
        ..PlayerConfig::default()
    });
    let image = PixelGrid::from_fn(8, 8, |p| Color::rgb(p.x as u8 * 30, p.y as u8 * 30, 0));
    player.set_image(Arc::new(image));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, SineColor::new())));
    player.play(Point::ORIGIN).unwrap();

    let mixer = player.mixer();
    let mut block = vec![Frame::silence(); 128];
    for _ in 0..200 {
        // Continuations run outside the render path and may allocate.
        player.pump();
        assert_no_alloc(|| lock_mixer(&mixer).render(&mut block));
    }
}

#[test]
fn scrubbing_render_is_alloc_free() {
    let player = Player::new(PlayerConfig {
        publishing: PointPublishing::None,
        drive: Drive::Manual,
        ..PlayerConfig::default()
    });
    let image = PixelGrid::from_fn(4, 4, |p| Color::rgb(p.x as u8 * 60, 200, p.y as u8 * 60));
    player.set_image(Arc::new(image));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, AudioScrubber::new(ramp(44100)))));
    player.play(Point::ORIGIN).unwrap();

    let mixer = player.mixer();
    let mut block = vec![Frame::silence(); 128];
    for _ in 0..200 {
        player.pump();
        assert_no_alloc(|| lock_mixer(&mixer).render(&mut block));
    }
}

#[test]
fn burst_of_empty_fragments_is_freed_off_the_render_path() {
    let player = Player::new(PlayerConfig {
        publishing: PointPublishing::None,
        drive: Drive::Manual,
        ..PlayerConfig::default()
    });
    // No green: every scrub window is empty.
    player.set_image(Arc::new(PixelGrid::filled(10, 10, Color::BLACK)));
    player.set_strategy(Arc::new(PixelSound::new(RowMajor, AudioScrubber::new(ramp(44100)))));
    for i in 0..100 {
        player.play_pixel(Point::new(i % 10, i / 10), true).unwrap();
    }

    let mixer = player.mixer();
    let mut block = vec![Frame::silence(); 128];
    assert_no_alloc(|| lock_mixer(&mixer).render(&mut block));
    assert!(block.iter().all(Frame::is_silent));

    let retired = lock_mixer(&mixer).queue.take_retired();
    assert_eq!(retired.len(), 100);
    assert_eq!(player.queued(), 0);
}
