// Thread-safe callback mechanism for controller events
// Progress callbacks fire on every timer tick; throttling keeps
// high-frequency consumers (FFI bridges, UI bindings) from being flooded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::PlayerError;
use crate::state::PlayerState;

/// Controller event types
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Controller state changed
    StateChanged {
        old_state: PlayerState,
        new_state: PlayerState,
    },

    /// Playback position updated
    Progress { current: f64, total: f64 },

    /// Playback ended, cleanly or with a failure
    Finished { error: Option<PlayerError> },

    /// One buffering episode completed; `episode` 0 is the initial load,
    /// later episodes are rebuffers
    BufferingUpdate { episode: u32, latency: Duration },

    /// Engine buffer fill level changed, 0-100
    BufferingProgress { percent: u32 },

    /// Loop playback wrapped around
    LoopCompleted { count: u32 },
}

/// Controller callback trait
/// Implementations should be lightweight and non-blocking
pub trait PlayerCallback: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: ControllerEvent);
}

/// Throttled callback wrapper
/// Prevents excessive callback frequency for progress updates
pub struct ThrottledCallback {
    inner: Arc<dyn PlayerCallback>,
    last_progress_update: Arc<Mutex<Option<Instant>>>,
    progress_update_interval: Duration,
}

impl ThrottledCallback {
    pub fn new(callback: Arc<dyn PlayerCallback>, update_interval_ms: u64) -> Self {
        Self {
            inner: callback,
            last_progress_update: Arc::new(Mutex::new(None)),
            progress_update_interval: Duration::from_millis(update_interval_ms),
        }
    }

    pub fn dispatch(&self, event: ControllerEvent) {
        match &event {
            ControllerEvent::Progress { .. } => {
                // Throttle progress updates
                let mut last_update = self.last_progress_update.lock();
                let due = match *last_update {
                    Some(at) => at.elapsed() >= self.progress_update_interval,
                    None => true,
                };
                if due {
                    *last_update = Some(Instant::now());
                    self.inner.on_event(event);
                }
            }
            _ => {
                // Other events are not throttled
                self.inner.on_event(event);
            }
        }
    }
}

/// Callback manager for handling multiple callbacks
pub struct CallbackManager {
    callbacks: Arc<Mutex<Vec<Arc<ThrottledCallback>>>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            callbacks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>, throttle_ms: u64) {
        let throttled = Arc::new(ThrottledCallback::new(callback, throttle_ms));
        self.callbacks.lock().push(throttled);
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.lock().clear();
    }

    pub fn dispatch_event(&self, event: ControllerEvent) {
        let callbacks = self.callbacks.lock();
        for callback in callbacks.iter() {
            callback.dispatch(event.clone());
        }
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recording callback for tests
#[cfg(test)]
pub struct TestCallback {
    events: Arc<Mutex<Vec<ControllerEvent>>>,
}

#[cfg(test)]
impl TestCallback {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<ControllerEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[cfg(test)]
impl PlayerCallback for TestCallback {
    fn on_event(&self, event: ControllerEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_throttled_progress() {
        let test_callback = Arc::new(TestCallback::new());
        let throttled = ThrottledCallback::new(test_callback.clone(), 100);

        // Send multiple progress updates rapidly
        for i in 0..10 {
            throttled.dispatch(ControllerEvent::Progress {
                current: i as f64 * 0.1,
                total: 10.0,
            });
            thread::sleep(Duration::from_millis(10));
        }

        // Should have received fewer than 10 events due to throttling
        let events = test_callback.get_events();
        assert!(!events.is_empty());
        assert!(events.len() < 10);
    }

    #[test]
    fn test_first_progress_passes_immediately() {
        let test_callback = Arc::new(TestCallback::new());
        let throttled = ThrottledCallback::new(test_callback.clone(), 10_000);

        throttled.dispatch(ControllerEvent::Progress {
            current: 0.0,
            total: 1.0,
        });
        assert_eq!(test_callback.get_events().len(), 1);
    }

    #[test]
    fn test_non_throttled_events() {
        let test_callback = Arc::new(TestCallback::new());
        let throttled = ThrottledCallback::new(test_callback.clone(), 10_000);

        // State changes should not be throttled
        throttled.dispatch(ControllerEvent::StateChanged {
            old_state: PlayerState::NotSetUrl,
            new_state: PlayerState::Buffering,
        });
        throttled.dispatch(ControllerEvent::StateChanged {
            old_state: PlayerState::Buffering,
            new_state: PlayerState::Paused,
        });

        let events = test_callback.get_events();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_manager_fan_out() {
        let manager = CallbackManager::new();
        let first = Arc::new(TestCallback::new());
        let second = Arc::new(TestCallback::new());
        manager.add_callback(first.clone(), 0);
        manager.add_callback(second.clone(), 0);

        manager.dispatch_event(ControllerEvent::Finished { error: None });

        assert_eq!(first.get_events().len(), 1);
        assert_eq!(second.get_events().len(), 1);

        manager.clear_callbacks();
        manager.dispatch_event(ControllerEvent::Finished { error: None });
        assert_eq!(first.get_events().len(), 1);
    }
}
