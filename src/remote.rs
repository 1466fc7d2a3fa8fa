// Remote transport-command bridge
// Platform media-session integration (lock screen, earphone buttons,
// remote controls) delivers a fixed set of transport verbs; the bridge
// accepts them only while a source is active and routes each into the
// corresponding controller method.

/// Seconds skipped by the forward/backward transport commands
pub const SKIP_INTERVAL_SECONDS: f64 = 15.0;

/// Transport verbs accepted from external media-session integrations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play,
    Pause,
    TogglePlayPause,
    SeekForward,
    SeekBackward,
    /// Scrub to an absolute position in seconds
    SeekTo(f64),
    /// Change the playback rate
    ChangeRate(f32),
    NextTrack,
    PreviousTrack,
}

/// Registration gate for transport commands. Registered on set_source,
/// unregistered on reset; commands arriving outside that window are
/// rejected.
pub struct RemoteCommandBridge {
    registered: bool,
}

impl RemoteCommandBridge {
    pub fn new() -> Self {
        Self { registered: false }
    }

    pub fn register(&mut self) {
        if !self.registered {
            log::debug!("transport commands registered");
            self.registered = true;
        }
    }

    pub fn unregister(&mut self) {
        if self.registered {
            log::debug!("transport commands unregistered");
            self.registered = false;
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

impl Default for RemoteCommandBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the active source for external now-playing displays.
/// Maintained by the controller: populated when the engine reports
/// prepared, elapsed time refreshed on progress ticks, cleared on reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Total duration in seconds
    pub duration: f64,
    /// Elapsed playback time in seconds
    pub elapsed: f64,
    pub playback_rate: f32,
    pub is_playing: bool,
}

impl NowPlayingInfo {
    pub fn clear(&mut self) {
        *self = NowPlayingInfo::default();
    }
}
