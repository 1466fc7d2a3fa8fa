// Playback orchestration core
// State machine and engine lifecycle for a media player: owns one
// pluggable playback engine at a time, mediates play/pause/seek, accounts
// buffering latency, and substitutes a fallback engine after recoverable
// decode failures. Decoding and rendering live behind the PlaybackEngine
// trait; UI, gestures and platform chrome live above the callback layer.

pub mod callback;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod options;
pub mod remote;
pub mod state;
pub mod timer;

// Re-exports
pub use callback::{ControllerEvent, PlayerCallback};
pub use controller::PlaybackController;
pub use engine::{EngineKind, EngineRegistry, LoadState, PlaybackEngine, PlaybackState, SeekCompletion};
pub use error::{PlayerError, Result};
pub use events::{EngineEvent, EngineEventSink};
pub use options::{DisplayMode, PlayerOptions};
pub use remote::{NowPlayingInfo, TransportCommand};
pub use state::PlayerState;
