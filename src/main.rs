//! pixelsound CLI: listen to an image.
//!
//! Usage:
//!   pixelsound picture.png
//!   pixelsound picture.png -t Random -s AudioScrubber --audio loop.wav
//!   pixelsound picture.png --keyboard --queue
//!   pixelsound picture.png --mouse
//!   pixelsound picture.png --wav out.wav --seconds 30
//!
//! While playing, type a command and press enter: `p` pauses or resumes,
//! `m` mutes or unmutes, `q` quits. In keyboard mode, `up`/`down`/`left`/
//! `right` (or `w`/`s`/`a`/`d`) move the cursor. In mouse mode, `x,y`
//! moves the pointer to that pixel.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use px_master::{
    AudioOutput, Key, NullOutput, Point, PointPublishing, Session, SessionConfig, Speaker,
    TriggerMode,
};

/// Redraw cadence of the status line.
const REDRAW: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "pixelsound")]
#[command(author, version, about = "Traverse an image and sonify its pixels")]
struct Args {
    /// Image to play (PNG or JPEG)
    image: PathBuf,

    /// Scale the image to this width before playing (0 keeps the original)
    #[arg(long, short = 'w', default_value = "100")]
    width: u32,

    /// Traversal strategy
    #[arg(long, short = 't', default_value = "RowMajor")]
    traversal: String,

    /// Sonification strategy
    #[arg(long, short = 's', default_value = "SineColor")]
    sonification: String,

    /// Audio file for the AudioScrubber sonification (WAV, MP3, Ogg or FLAC)
    #[arg(long, short = 'a')]
    audio: Option<PathBuf>,

    /// Move a cursor with the arrow keys instead of traversing
    #[arg(long, short = 'k')]
    keyboard: bool,

    /// Play the pixel under the pointer; type `x,y` to move it
    #[arg(long, short = 'm', conflicts_with = "keyboard")]
    mouse: bool,

    /// Queue triggered pixels instead of cutting off the current one
    #[arg(long, short = 'q')]
    queue: bool,

    /// Render offline to this WAV file instead of playing
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Stop after this many seconds (offline default: 300)
    #[arg(long)]
    seconds: Option<f64>,

    /// Volume as a base-2 exponent: 0 is unity, -1 is half
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    volume: f64,

    /// Seed for the Random traversal
    #[arg(long)]
    seed: Option<u64>,

    /// Render in real time without an audio device
    #[arg(long)]
    null_audio: bool,

    /// Sample rate for offline and null-audio rendering
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Frames per render cycle
    #[arg(long, default_value = "2048")]
    buffer_size: usize,

    /// Fragments queued ahead during traversal
    #[arg(long, default_value = "2")]
    lookahead: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SessionConfig {
        image: args.image.clone(),
        resize_width: (args.width > 0).then_some(args.width),
        audio: args.audio.clone(),
        traversal: args.traversal.clone(),
        sonification: args.sonification.clone(),
        trigger: if args.keyboard {
            TriggerMode::Keyboard
        } else if args.mouse {
            TriggerMode::Pointer
        } else {
            TriggerMode::Traverse
        },
        queue: args.queue,
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        volume: args.volume,
        publishing: PointPublishing::Latest,
        lookahead: args.lookahead,
        seed: args.seed,
        ..SessionConfig::default()
    };

    match &args.wav {
        Some(path) => render_to_wav(&config, path, args.seconds.unwrap_or(300.0)),
        None => play_live(config, &args),
    }
}

fn render_to_wav(config: &SessionConfig, path: &Path, seconds: f64) -> Result<()> {
    println!("Rendering to {} at {} Hz...", path.display(), config.sample_rate);
    let frames = px_master::render_to_wav(config, path, seconds)
        .with_context(|| format!("rendering {}", config.image.display()))?;
    println!(
        "Rendered {} frames ({:.2} s)",
        frames,
        frames as f64 / config.sample_rate as f64
    );
    println!("Done.");
    Ok(())
}

fn play_live(mut config: SessionConfig, args: &Args) -> Result<()> {
    let output: Box<dyn AudioOutput> = if args.null_audio {
        Box::new(NullOutput::new(config.sample_rate, config.buffer_size))
    } else {
        let speaker = Speaker::new(config.buffer_size).context("opening audio device")?;
        config.sample_rate = speaker.sample_rate();
        Box::new(speaker)
    };

    let mut session = Session::open(config.clone())
        .with_context(|| format!("loading {}", config.image.display()))?;
    session.attach_output(output).context("starting audio output")?;
    session.begin().context("starting playback")?;

    let quit = Arc::new(AtomicBool::new(false));
    spawn_command_reader(&session, quit.clone());

    let latest = session.player().latest_point();
    let started = Instant::now();
    println!("Playing...");
    println!();

    loop {
        if quit.load(Ordering::Relaxed) {
            break;
        }
        if config.trigger == TriggerMode::Traverse && session.is_finished() {
            break;
        }
        if args.seconds.is_some_and(|s| started.elapsed().as_secs_f64() >= s) {
            break;
        }
        if let Some(point) = latest.as_ref().and_then(|l| l.get()) {
            let transport = session.player().transport();
            print!(
                "\rPoint: ({:4}, {:4}){}{}   ",
                point.x,
                point.y,
                if transport.paused() { " [paused]" } else { "" },
                if transport.muted() { " [muted]" } else { "" },
            );
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(REDRAW);
    }

    session.stop();
    println!("\rDone.                              ");
    Ok(())
}

/// Read commands from stdin on a background thread.
fn spawn_command_reader(session: &Session, quit: Arc<AtomicBool>) {
    let player = session.player().clone();
    let input = session.input().clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "q" | "quit" => {
                    quit.store(true, Ordering::Relaxed);
                    break;
                }
                "p" | "pause" => {
                    player.toggle_playback();
                }
                "m" | "mute" => {
                    player.toggle_mute();
                }
                "" => {}
                cmd => {
                    if let Ok(key) = cmd.parse::<Key>() {
                        if input.dispatch_key(key) == 0 {
                            log::info!("cursor keys only work with --keyboard");
                        }
                    } else if let Some(point) = parse_point(cmd) {
                        if input.dispatch_pointer(point) == 0 {
                            log::info!("pointer moves only work with --mouse");
                        }
                    } else {
                        log::warn!("unknown command {cmd:?}");
                    }
                }
            }
        }
    });
}

/// `x,y` (spaces allowed) as a pixel position.
fn parse_point(s: &str) -> Option<Point> {
    let (x, y) = s.split_once(',')?;
    Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}
