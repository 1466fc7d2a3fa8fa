// Playback engine contract
// All engine implementations (platform-native, software decode, ...) are
// driven through this trait; the controller never branches on a concrete
// engine type beyond the EngineKind selection and fallback policies.

use std::collections::HashMap;

use crate::error::Result;
use crate::events::EngineEventSink;
use crate::options::PlayerOptions;

/// Engine-reported playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Seeking,
    Finished,
    Stopped,
}

/// Engine-reported load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    /// Enough data buffered to render without stalling
    Playable,
}

/// Completion callback for an asynchronous seek. The flag is true when the
/// engine actually landed on the target, false when the seek was rejected
/// or superseded.
pub type SeekCompletion = Box<dyn FnOnce(bool) + Send>;

/// Core playback engine trait.
/// Engines may run decode work on background threads but must deliver all
/// notifications through the [`EngineEventSink`] they were constructed
/// with; the sink queues them for the controller's owning thread.
pub trait PlaybackEngine: Send {
    /// Begin asynchronous preparation; readiness arrives as an event.
    /// Repeated calls while preparation is in flight must be tolerated.
    fn prepare_to_play(&mut self);

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Seek to a position in seconds; completion fires when the engine
    /// settles on (or rejects) the target
    fn seek(&mut self, time: f64, completion: SeekCompletion);

    /// Release decoder resources. Must be safe to call more than once.
    fn shutdown(&mut self);

    /// Swap the source in place, reusing the engine instance
    fn replace(&mut self, url: &str, options: &PlayerOptions);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Total duration in seconds (0 when unknown)
    fn duration(&self) -> f64;

    fn playback_rate(&self) -> f32;
    fn set_playback_rate(&mut self, rate: f32);

    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);

    /// Whether preparation has completed
    fn is_prepared(&self) -> bool;

    /// Whether the current source supports seeking
    fn seekable(&self) -> bool;

    fn load_state(&self) -> LoadState;
    fn playback_state(&self) -> PlaybackState;

    /// Source metadata (title, artist, ...) once known
    fn metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// The closed set of engine implementations the controller can select
/// between. Selection policy lives in the controller; construction goes
/// through the [`EngineRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Platform playback engine; required for wireless casting routes
    Platform,
    /// Software decode engine; required for non-planar display modes
    Software,
}

type EngineFactory =
    Box<dyn Fn(&str, &PlayerOptions, EngineEventSink) -> Result<Box<dyn PlaybackEngine>> + Send>;

/// Maps each engine kind to its constructor. The set of kinds is closed at
/// compile time; consumers register a factory per kind they support.
pub struct EngineRegistry {
    factories: HashMap<EngineKind, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or override) the factory for one engine kind
    pub fn register<F>(mut self, kind: EngineKind, factory: F) -> Self
    where
        F: Fn(&str, &PlayerOptions, EngineEventSink) -> Result<Box<dyn PlaybackEngine>>
            + Send
            + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
        self
    }

    pub fn supports(&self, kind: EngineKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Construct an engine of the given kind
    pub fn construct(
        &self,
        kind: EngineKind,
        url: &str,
        options: &PlayerOptions,
        sink: EngineEventSink,
    ) -> Result<Box<dyn PlaybackEngine>> {
        let factory = self.factories.get(&kind).ok_or_else(|| {
            crate::error::PlayerError::InitializationError(format!(
                "no factory registered for engine kind {:?}",
                kind
            ))
        })?;
        log::info!("constructing {:?} engine for {}", kind, url);
        factory(url, options, sink)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::events::EventQueue;

    struct NullEngine;

    impl PlaybackEngine for NullEngine {
        fn prepare_to_play(&mut self) {}
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn seek(&mut self, _time: f64, completion: SeekCompletion) {
            completion(false);
        }
        fn shutdown(&mut self) {}
        fn replace(&mut self, _url: &str, _options: &PlayerOptions) {}
        fn current_time(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> f64 {
            0.0
        }
        fn playback_rate(&self) -> f32 {
            1.0
        }
        fn set_playback_rate(&mut self, _rate: f32) {}
        fn volume(&self) -> f32 {
            1.0
        }
        fn set_volume(&mut self, _volume: f32) {}
        fn is_prepared(&self) -> bool {
            false
        }
        fn seekable(&self) -> bool {
            false
        }
        fn load_state(&self) -> LoadState {
            LoadState::Idle
        }
        fn playback_state(&self) -> PlaybackState {
            PlaybackState::Idle
        }
    }

    #[test]
    fn test_registry_construct() {
        let registry = EngineRegistry::new()
            .register(EngineKind::Platform, |_, _, _| Ok(Box::new(NullEngine)));

        assert!(registry.supports(EngineKind::Platform));
        assert!(!registry.supports(EngineKind::Software));

        let queue = EventQueue::new();
        let engine = registry.construct(
            EngineKind::Platform,
            "file:///a.mp4",
            &PlayerOptions::default(),
            EngineEventSink::new(queue),
        );
        assert!(engine.is_ok());
    }

    #[test]
    fn test_registry_missing_kind() {
        let registry = EngineRegistry::new();
        let queue = EventQueue::new();
        let result = registry.construct(
            EngineKind::Software,
            "file:///a.mp4",
            &PlayerOptions::default(),
            EngineEventSink::new(queue),
        );
        assert!(matches!(result, Err(PlayerError::InitializationError(_))));
    }
}
