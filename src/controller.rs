// Playback controller
// Owns exactly one playback engine at a time and drives the session state
// machine from consumer calls and queued engine/timer messages. All public
// methods and process_events() must be called from one owning thread.

use std::time::{Duration, Instant};

use crate::callback::{CallbackManager, ControllerEvent, PlayerCallback};
use crate::engine::{EngineKind, EngineRegistry, LoadState, PlaybackEngine, PlaybackState};
use crate::error::PlayerError;
use crate::events::{EngineEvent, EngineEventSink, EventQueue, PlayerMessage};
use crate::options::{DisplayMode, PlayerOptions};
use crate::remote::{NowPlayingInfo, RemoteCommandBridge, TransportCommand, SKIP_INTERVAL_SECONDS};
use crate::state::{self, PlayerState};
use crate::timer::ProgressTimer;

pub struct PlaybackController {
    registry: EngineRegistry,
    callbacks: CallbackManager,
    queue: EventQueue,

    state: PlayerState,
    options: PlayerOptions,
    url: Option<String>,
    urls: Vec<String>,

    engine: Option<Box<dyn PlaybackEngine>>,
    engine_kind: Option<EngineKind>,

    timer: Option<ProgressTimer>,
    remote: RemoteCommandBridge,
    now_playing: NowPlayingInfo,

    auto_play: bool,
    /// Seek target stored while the engine is not yet prepared
    should_seek_to: f64,
    /// Completed buffering episodes this session; 0 means the initial
    /// load has not finished yet
    buffered_count: u32,
    /// Set when a measurable buffering episode begins
    buffer_start: Option<Instant>,
    buffering_progress: u32,
    loop_count: u32,
}

impl PlaybackController {
    pub fn new(registry: EngineRegistry) -> Self {
        Self {
            registry,
            callbacks: CallbackManager::new(),
            queue: EventQueue::new(),
            state: PlayerState::NotSetUrl,
            options: PlayerOptions::default(),
            url: None,
            urls: Vec::new(),
            engine: None,
            engine_kind: None,
            timer: None,
            remote: RemoteCommandBridge::new(),
            now_playing: NowPlayingInfo::default(),
            auto_play: false,
            should_seek_to: 0.0,
            buffered_count: 0,
            buffer_start: None,
            buffering_progress: 0,
            loop_count: 0,
        }
    }

    /// Register a consumer callback; progress events are throttled to
    /// `throttle_ms`, all other events pass through unthrottled.
    pub fn add_callback(&self, callback: std::sync::Arc<dyn PlayerCallback>, throttle_ms: u64) {
        self.callbacks.add_callback(callback, throttle_ms);
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.clear_callbacks();
    }

    // Read-only session properties

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn engine_kind(&self) -> Option<EngineKind> {
        self.engine_kind
    }

    pub fn current_time(&self) -> f64 {
        self.engine.as_ref().map(|e| e.current_time()).unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.engine.as_ref().map(|e| e.duration()).unwrap_or(0.0)
    }

    /// Engine buffer fill level, 0-100
    pub fn buffering_progress(&self) -> u32 {
        self.buffering_progress
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn now_playing(&self) -> &NowPlayingInfo {
        &self.now_playing
    }

    /// Whether the progress timer is currently delivering ticks
    pub fn is_polling(&self) -> bool {
        self.timer.as_ref().map(|t| t.is_armed()).unwrap_or(false)
    }

    /// Set a single source. Selects the engine kind for the current
    /// configuration, reusing the active engine in place when the kind
    /// matches.
    pub fn set_source(&mut self, url: &str, options: PlayerOptions) {
        log::info!("set source: {}", url);
        self.options = options;
        self.auto_play = self.options.is_auto_play;
        self.apply_url(url);
        self.ensure_timer();
        if self.options.register_remote_commands {
            self.remote.register();
        } else {
            self.remote.unregister();
        }
    }

    /// Set a playlist; playback starts with the first entry and advances
    /// automatically after each clean finish.
    pub fn set_sources(&mut self, urls: &[String], options: PlayerOptions) {
        self.urls = urls.to_vec();
        if let Some(first) = self.urls.first().cloned() {
            self.set_source(&first, options);
        } else {
            self.options = options;
        }
    }

    pub fn play(&mut self) {
        self.auto_play = true;
        if self.engine.is_none() {
            // No engine yet; playback starts once a source is set
            self.transition(PlayerState::Buffering);
            return;
        }
        let prepared = self.engine.as_ref().map(|e| e.is_prepared()).unwrap_or(false);
        if self.state == PlayerState::Error || !prepared {
            // Kick preparation (again, after a failure); readiness arrives
            // as an event
            if let Some(engine) = self.engine.as_mut() {
                engine.prepare_to_play();
            }
        }
        if prepared {
            if self.state == PlayerState::PlayedToTheEnd {
                // Replay from the top; resume once the seek lands
                let queue = self.queue.clone();
                if let Some(engine) = self.engine.as_mut() {
                    engine.seek(
                        0.0,
                        Box::new(move |finished| {
                            queue.push(PlayerMessage::SeekFinished {
                                finished,
                                auto_play: true,
                            });
                        }),
                    );
                }
            } else if let Some(engine) = self.engine.as_mut() {
                engine.play();
            }
            if let Some(timer) = self.timer.as_ref() {
                timer.arm();
            }
        }
        let load_state = self
            .engine
            .as_ref()
            .map(|e| e.load_state())
            .unwrap_or(LoadState::Idle);
        let next = if load_state == LoadState::Playable {
            PlayerState::BufferFinished
        } else {
            PlayerState::Buffering
        };
        self.transition(next);
        self.now_playing.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.auto_play = false;
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
        }
        if let Some(timer) = self.timer.as_ref() {
            timer.disarm();
        }
        self.transition(PlayerState::Paused);
        self.now_playing.is_playing = false;
    }

    /// Seek to `time` (seconds). Non-finite targets are ignored. While the
    /// engine is still preparing the target is stored and executed once
    /// the prepared notification arrives.
    pub fn seek(&mut self, time: f64, auto_play: bool) {
        if !time.is_finite() {
            log::warn!("ignoring seek to non-finite time");
            return;
        }
        if auto_play {
            self.transition(PlayerState::Buffering);
        }
        let ready = self
            .engine
            .as_ref()
            .map(|e| e.is_prepared() && e.seekable())
            .unwrap_or(false);
        if ready {
            let queue = self.queue.clone();
            if let Some(engine) = self.engine.as_mut() {
                engine.seek(
                    time,
                    Box::new(move |finished| {
                        queue.push(PlayerMessage::SeekFinished {
                            finished,
                            auto_play,
                        });
                    }),
                );
            }
        } else {
            self.auto_play = auto_play;
            self.should_seek_to = time;
        }
    }

    /// Tear the session down: unregister transport commands, stop the
    /// timer thread, shut the engine down and return to the initial
    /// state. The only cancellation primitive; anything in flight on the
    /// engine is abandoned.
    pub fn reset(&mut self) {
        log::info!("reset player");
        self.remote.unregister();
        if let Some(mut timer) = self.timer.take() {
            timer.invalidate();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }
        self.engine_kind = None;
        self.queue.clear();
        self.urls.clear();
        self.url = None;
        self.auto_play = false;
        self.buffer_start = None;
        self.reset_session();
    }

    /// Drain and apply all pending engine/timer messages, in arrival
    /// order. Call this regularly from the owning thread.
    pub fn process_events(&mut self) {
        while let Some(message) = self.queue.pop() {
            match message {
                PlayerMessage::Engine(event) => self.handle_engine_event(event),
                PlayerMessage::Tick => self.handle_tick(),
                PlayerMessage::SeekFinished { finished, auto_play } => {
                    if finished && auto_play {
                        self.play();
                    }
                }
            }
        }
    }

    /// Route an external transport command. Returns false when commands
    /// are not registered or no source is active.
    pub fn handle_transport(&mut self, command: TransportCommand) -> bool {
        if !self.remote.is_registered() || self.engine.is_none() {
            return false;
        }
        match command {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::TogglePlayPause => {
                if self.state.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            TransportCommand::SeekForward => {
                let target = self.current_time() + SKIP_INTERVAL_SECONDS;
                let auto_play = self.options.is_seeked_auto_play;
                self.seek(target, auto_play);
            }
            TransportCommand::SeekBackward => {
                let target = (self.current_time() - SKIP_INTERVAL_SECONDS).max(0.0);
                let auto_play = self.options.is_seeked_auto_play;
                self.seek(target, auto_play);
            }
            TransportCommand::SeekTo(target) => {
                let auto_play = self.options.is_seeked_auto_play;
                self.seek(target, auto_play);
            }
            TransportCommand::ChangeRate(rate) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_playback_rate(rate);
                }
                self.now_playing.playback_rate = rate;
            }
            TransportCommand::NextTrack => self.next_source(),
            TransportCommand::PreviousTrack => self.previous_source(),
        }
        true
    }

    // Engine lifecycle

    fn select_engine_kind(&self) -> EngineKind {
        if self.options.wireless_route_active {
            // Wireless routes need the casting-capable platform engine
            EngineKind::Platform
        } else if self.options.display != DisplayMode::Plane {
            // Immersive display modes only work with software decode
            EngineKind::Software
        } else {
            self.options.first_engine
        }
    }

    fn apply_url(&mut self, url: &str) {
        let kind = self.select_engine_kind();
        let same_kind = self.engine.is_some() && self.engine_kind == Some(kind);
        let same_url = self.url.as_deref() == Some(url);
        self.url = Some(url.to_string());
        if same_kind {
            if same_url {
                if self.auto_play {
                    self.play();
                }
            } else {
                // Reuse the engine instance, swap the source in place
                self.reset_session();
                if let Some(engine) = self.engine.as_mut() {
                    engine.replace(url, &self.options);
                }
                self.prepare_session();
            }
        } else {
            self.reset_session();
            self.construct_engine(kind);
        }
    }

    /// Replace the active engine with a freshly constructed one of `kind`,
    /// carrying playback rate and volume across. The previous engine is
    /// shut down before the new one takes over the session.
    fn construct_engine(&mut self, kind: EngineKind) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let carried = self.engine.as_ref().map(|e| (e.playback_rate(), e.volume()));
        if let Some(mut old) = self.engine.take() {
            old.shutdown();
        }
        let sink = EngineEventSink::new(self.queue.clone());
        match self.registry.construct(kind, &url, &self.options, sink) {
            Ok(mut engine) => {
                if let Some((rate, volume)) = carried {
                    engine.set_playback_rate(rate);
                    engine.set_volume(volume);
                }
                self.engine = Some(engine);
                self.engine_kind = Some(kind);
                self.prepare_session();
            }
            Err(err) => {
                log::error!("engine construction failed: {}", err);
                self.engine_kind = Some(kind);
                // Surfaced through the normal failure path, never thrown
                self.queue
                    .push(PlayerMessage::Engine(EngineEvent::Finished(Some(err))));
            }
        }
    }

    /// Start a fresh preparation cycle on the current engine
    fn prepare_session(&mut self) {
        self.buffer_start = Some(Instant::now());
        self.buffered_count = 0;
        if let Some(engine) = self.engine.as_mut() {
            engine.prepare_to_play();
        }
    }

    /// Clear per-source session state without touching the engine's
    /// lifetime
    fn reset_session(&mut self) {
        self.transition(PlayerState::NotSetUrl);
        self.buffered_count = 0;
        self.should_seek_to = 0.0;
        self.buffering_progress = 0;
        self.loop_count = 0;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_playback_rate(1.0);
            engine.set_volume(1.0);
        }
        self.now_playing.clear();
    }

    fn ensure_timer(&mut self) {
        if self.timer.is_none() {
            self.timer = Some(ProgressTimer::spawn(
                Duration::from_millis(self.options.progress_interval_ms),
                self.queue.clone(),
            ));
        }
    }

    // Engine event handling

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Prepared => self.on_prepared(),
            EngineEvent::LoadStateChanged => self.on_load_state_changed(),
            EngineEvent::BufferingProgress(percent) => {
                self.buffering_progress = percent;
                self.callbacks
                    .dispatch_event(ControllerEvent::BufferingProgress { percent });
            }
            EngineEvent::LoopCompleted(count) => {
                self.loop_count = count;
                self.callbacks
                    .dispatch_event(ControllerEvent::LoopCompleted { count });
            }
            EngineEvent::Finished(error) => self.on_finished(error),
        }
    }

    fn on_prepared(&mut self) {
        self.update_now_playing_info();
        self.transition(PlayerState::ReadyToPlay);
        if self.auto_play {
            if self.should_seek_to > 0.0 {
                let target = self.should_seek_to;
                self.should_seek_to = 0.0;
                self.seek(target, true);
            } else {
                self.play();
            }
        }
    }

    fn on_load_state_changed(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        // Suppress transient load-state flicker while a seek is in flight
        if engine.playback_state() == PlaybackState::Seeking {
            return;
        }
        let load_state = engine.load_state();

        if load_state == LoadState::Playable {
            if let Some(started) = self.buffer_start.take() {
                let latency = started.elapsed();
                log::info!(
                    "buffering episode {} finished in {:?}",
                    self.buffered_count,
                    latency
                );
                self.callbacks.dispatch_event(ControllerEvent::BufferingUpdate {
                    episode: self.buffered_count,
                    latency,
                });
                self.buffered_count += 1;
            }
        }

        if !self.state.is_playing() {
            return;
        }
        if load_state == LoadState::Playable {
            self.transition(PlayerState::BufferFinished);
        } else {
            if self.state == PlayerState::BufferFinished {
                self.buffer_start = Some(Instant::now());
            }
            self.transition(PlayerState::Buffering);
        }
    }

    fn on_finished(&mut self, error: Option<PlayerError>) {
        if let Some(err) = error.as_ref() {
            if err.is_recoverable() {
                if let Some(second) = self.options.second_engine {
                    if self.engine_kind != Some(second) && self.registry.supports(second) {
                        log::warn!(
                            "engine failed ({}), substituting {:?} engine",
                            err,
                            second
                        );
                        self.construct_engine(second);
                        return;
                    }
                }
            }
            log::error!("playback failed: {}", err);
            self.transition(PlayerState::Error);
        } else {
            let duration = self.duration();
            self.callbacks.dispatch_event(ControllerEvent::Progress {
                current: duration,
                total: duration,
            });
            self.transition(PlayerState::PlayedToTheEnd);
        }
        if let Some(timer) = self.timer.as_ref() {
            timer.disarm();
        }
        // A rebuffer after the end must never report as the initial episode
        self.buffered_count = 1;
        self.callbacks
            .dispatch_event(ControllerEvent::Finished { error: error.clone() });
        if error.is_none() {
            self.next_source();
        }
    }

    fn handle_tick(&mut self) {
        let (current, total, playing, playable, prepared) = match self.engine.as_ref() {
            Some(engine) => (
                engine.current_time(),
                engine.duration(),
                engine.playback_state() == PlaybackState::Playing,
                engine.load_state() == LoadState::Playable,
                engine.is_prepared(),
            ),
            None => return,
        };
        if !prepared {
            return;
        }
        self.callbacks
            .dispatch_event(ControllerEvent::Progress { current, total });
        if playing && playable && self.state == PlayerState::Buffering {
            // Missed load-state notification; realign
            self.transition(PlayerState::BufferFinished);
        }
        if playing {
            self.now_playing.elapsed = current;
        }
    }

    // Internal helpers

    fn transition(&mut self, new_state: PlayerState) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        if !state::is_valid_transition(old_state, new_state) {
            log::warn!("unexpected state transition {} -> {}", old_state, new_state);
        }
        self.state = new_state;
        log::debug!("player state changed to: {}", new_state);
        self.callbacks.dispatch_event(ControllerEvent::StateChanged {
            old_state,
            new_state,
        });
    }

    fn update_now_playing_info(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let metadata = engine.metadata();
        self.now_playing.duration = engine.duration();
        self.now_playing.playback_rate = engine.playback_rate();
        if self.now_playing.title.is_none() {
            self.now_playing.title = metadata.get("title").cloned();
        }
        if self.now_playing.artist.is_none() {
            self.now_playing.artist = metadata.get("artist").cloned();
        }
    }

    fn next_source(&mut self) {
        if self.urls.len() <= 1 {
            return;
        }
        let Some(current) = self.url.clone() else {
            return;
        };
        let Some(index) = self.urls.iter().position(|u| *u == current) else {
            return;
        };
        if index + 1 < self.urls.len() {
            let next = self.urls[index + 1].clone();
            log::info!("advancing to next source: {}", next);
            self.auto_play = true;
            self.apply_url(&next);
        }
    }

    fn previous_source(&mut self) {
        if self.urls.len() <= 1 {
            return;
        }
        let Some(current) = self.url.clone() else {
            return;
        };
        let Some(index) = self.urls.iter().position(|u| *u == current) else {
            return;
        };
        if index > 0 {
            let previous = self.urls[index - 1].clone();
            log::info!("returning to previous source: {}", previous);
            self.auto_play = true;
            self.apply_url(&previous);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.reset();
    }
}
