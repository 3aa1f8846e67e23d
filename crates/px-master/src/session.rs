//! A configured playback session, live or offline.

use std::path::Path;
use std::sync::Arc;

use px_audio::{AudioError, AudioOutput};
use px_engine::{Drive, Player, PlayerConfig, PlayerError, PlayerState, PointReceiver};
use px_ir::{AudioSource, Frame, PixelGrid, PixelSource};

use crate::config::{SessionConfig, TriggerMode};
use crate::input::{bind_pointer, InputRegistry, KeyboardCursor, Subscription};
use crate::{registry, ConfigError};

/// Frames rendered between continuation pumps when rendering offline.
const OFFLINE_BLOCK: usize = 64;

/// An image and strategy loaded into a player, plus whatever drives it.
pub struct Session {
    config: SessionConfig,
    image: Arc<PixelGrid>,
    player: Arc<Player>,
    points: Option<PointReceiver>,
    input: InputRegistry,
    cursor: Option<Arc<KeyboardCursor>>,
    subscriptions: Vec<Subscription>,
    output: Option<Box<dyn AudioOutput>>,
}

impl Session {
    /// Decode the configured files and build a player with a worker
    /// thread.
    pub fn open(config: SessionConfig) -> Result<Self, ConfigError> {
        let image = px_formats::load_image(&config.image, config.resize_width)?;
        let audio = match &config.audio {
            Some(path) if registry::needs_audio(&config.sonification) => {
                Some(registry::load_source(path)?)
            }
            _ => None,
        };
        Self::build(config, image, audio, Drive::Threaded)
    }

    /// Build from already decoded media.
    pub fn build(
        config: SessionConfig,
        image: PixelGrid,
        audio: Option<Arc<dyn AudioSource>>,
        drive: Drive,
    ) -> Result<Self, ConfigError> {
        let strategy = registry::strategy(&config.traversal, &config.sonification, config.seed, audio)?;

        let mut player = Player::new(PlayerConfig {
            sample_rate: config.sample_rate,
            publishing: config.publishing,
            channel_capacity: config.channel_capacity,
            lookahead: config.lookahead,
            drive,
        });
        let points = player.take_point_receiver();
        let image = Arc::new(image);
        player.set_image(image.clone());
        player.set_strategy(strategy);
        player.set_volume(config.volume);

        log::info!(
            "session: {}x{} image, {} / {}, {:?}",
            image.bounds().width(),
            image.bounds().height(),
            config.traversal,
            config.sonification,
            config.trigger
        );

        Ok(Self {
            config,
            image,
            player: Arc::new(player),
            points,
            input: InputRegistry::new(),
            cursor: None,
            subscriptions: Vec::new(),
            output: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn image(&self) -> &Arc<PixelGrid> {
        &self.image
    }

    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    /// Where pointer and key events should be dispatched.
    pub fn input(&self) -> &InputRegistry {
        &self.input
    }

    pub fn cursor(&self) -> Option<&Arc<KeyboardCursor>> {
        self.cursor.as_ref()
    }

    pub fn take_point_receiver(&mut self) -> Option<PointReceiver> {
        self.points.take()
    }

    /// Start pulling audio through `output`.
    pub fn attach_output(&mut self, mut output: Box<dyn AudioOutput>) -> Result<(), AudioError> {
        if output.sample_rate() != self.config.sample_rate {
            log::warn!(
                "output runs at {} Hz but fragments are rendered for {} Hz",
                output.sample_rate(),
                self.config.sample_rate
            );
        }
        output.start(self.player.mixer())?;
        self.output = Some(output);
        Ok(())
    }

    /// Start playing according to the trigger mode: autoplay from the
    /// top-left pixel, bind the arrow keys to a cursor, or follow the
    /// pointer.
    pub fn begin(&mut self) -> Result<(), PlayerError> {
        match self.config.trigger {
            TriggerMode::Traverse => self.player.play(self.image.bounds().min),
            TriggerMode::Keyboard => {
                let cursor = Arc::new(KeyboardCursor::new(
                    self.player.clone(),
                    self.image.bounds(),
                    self.config.queue,
                ));
                self.subscriptions = cursor.bind(&self.input);
                self.cursor = Some(cursor);
                Ok(())
            }
            TriggerMode::Pointer => {
                let sub = bind_pointer(
                    self.player.clone(),
                    self.image.bounds(),
                    self.config.queue,
                    &self.input,
                );
                self.subscriptions = vec![sub];
                Ok(())
            }
        }
    }

    /// Whether there is nothing left to hear: no traversal running and an
    /// empty queue.
    pub fn is_finished(&self) -> bool {
        self.player.state() != PlayerState::Autoplaying && self.player.queued() == 0
    }

    pub fn stop(&mut self) {
        self.subscriptions.clear();
        self.player.stop();
        if let Some(mut output) = self.output.take() {
            if let Err(e) = output.stop() {
                log::warn!("stopping output: {e}");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render a traversal without an audio device. Stops after `max_seconds`
/// or once the traversal has played out, whichever comes first.
pub fn render_offline(
    config: &SessionConfig,
    image: PixelGrid,
    audio: Option<Arc<dyn AudioSource>>,
    max_seconds: f64,
) -> Result<Vec<Frame>, ConfigError> {
    let mut config = config.clone();
    config.trigger = TriggerMode::Traverse;
    let mut session = Session::build(config, image, audio, Drive::Manual)?;
    let max_frames = (session.config.sample_rate as f64 * max_seconds.max(0.0)) as usize;

    let player = session.player.clone();
    if let Err(e) = player.play(session.image.bounds().min) {
        log::warn!("offline render did not start: {e}");
        return Ok(Vec::new());
    }
    let mut frames = vec![Frame::silence(); max_frames];
    let mut rendered = 0;
    while rendered < max_frames {
        player.pump();
        if session.is_finished() {
            break;
        }
        let end = (rendered + OFFLINE_BLOCK).min(max_frames);
        player.render(&mut frames[rendered..end]);
        rendered = end;
    }
    frames.truncate(rendered);
    log::info!(
        "rendered {} frames ({:.2} s)",
        rendered,
        rendered as f64 / session.config.sample_rate.max(1) as f64
    );
    session.stop();
    Ok(frames)
}

/// Render a traversal of the configured files to a WAV file.
pub fn render_to_wav(config: &SessionConfig, out: &Path, max_seconds: f64) -> Result<usize, ConfigError> {
    let image = px_formats::load_image(&config.image, config.resize_width)?;
    let audio = match &config.audio {
        Some(path) if registry::needs_audio(&config.sonification) => Some(registry::load_source(path)?),
        _ => None,
    };
    let frames = render_offline(config, image, audio, max_seconds)?;
    let mut file = std::io::BufWriter::new(std::fs::File::create(out)?);
    px_formats::write_wav(&mut file, &frames, config.sample_rate)?;
    Ok(frames.len())
}
