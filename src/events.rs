// Inbound event plumbing between engines/timer and the controller
// Engines run on their own threads; everything they report is queued here
// and applied on the controller's owning thread, in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PlayerError;

/// Notifications a playback engine delivers to its controller.
/// Payload-free variants are resolved by querying the engine's current
/// properties when the event is applied.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Preparation finished; duration/metadata are now readable
    Prepared,
    /// The engine's load state moved between loading and playable
    LoadStateChanged,
    /// Buffer fill level changed, 0-100
    BufferingProgress(u32),
    /// The engine looped back to the start (loop playback enabled)
    LoopCompleted(u32),
    /// Playback ended; `Some` carries the failure, `None` means the source
    /// played through to its end
    Finished(Option<PlayerError>),
}

/// Everything the controller's message pump can receive.
#[derive(Debug, Clone)]
pub enum PlayerMessage {
    Engine(EngineEvent),
    /// Periodic progress tick from the polling timer
    Tick,
    /// A previously issued seek settled; `auto_play` carries the caller's
    /// intent across the async boundary
    SeekFinished { finished: bool, auto_play: bool },
}

/// Shared FIFO of pending messages. Cloning shares the underlying queue.
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<PlayerMessage>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, message: PlayerMessage) {
        self.inner.lock().push_back(message);
    }

    pub fn pop(&self) -> Option<PlayerMessage> {
        self.inner.lock().pop_front()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The delegate slot handed to each engine at construction. Engines call
/// these from whatever thread does their decode work; delivery to the
/// controller happens when the owner drains the queue.
#[derive(Clone)]
pub struct EngineEventSink {
    queue: EventQueue,
}

impl EngineEventSink {
    pub fn new(queue: EventQueue) -> Self {
        Self { queue }
    }

    pub fn prepared(&self) {
        self.queue.push(PlayerMessage::Engine(EngineEvent::Prepared));
    }

    pub fn load_state_changed(&self) {
        self.queue
            .push(PlayerMessage::Engine(EngineEvent::LoadStateChanged));
    }

    pub fn buffering_progress(&self, percent: u32) {
        self.queue.push(PlayerMessage::Engine(EngineEvent::BufferingProgress(
            percent.min(100),
        )));
    }

    pub fn loop_completed(&self, count: u32) {
        self.queue
            .push(PlayerMessage::Engine(EngineEvent::LoopCompleted(count)));
    }

    pub fn finished(&self, error: Option<PlayerError>) {
        self.queue
            .push(PlayerMessage::Engine(EngineEvent::Finished(error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order() {
        let queue = EventQueue::new();
        let sink = EngineEventSink::new(queue.clone());

        sink.prepared();
        sink.load_state_changed();
        sink.finished(None);

        assert_eq!(queue.len(), 3);
        assert!(matches!(
            queue.pop(),
            Some(PlayerMessage::Engine(EngineEvent::Prepared))
        ));
        assert!(matches!(
            queue.pop(),
            Some(PlayerMessage::Engine(EngineEvent::LoadStateChanged))
        ));
        assert!(matches!(
            queue.pop(),
            Some(PlayerMessage::Engine(EngineEvent::Finished(None)))
        ));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_buffering_progress_clamped() {
        let queue = EventQueue::new();
        let sink = EngineEventSink::new(queue.clone());

        sink.buffering_progress(250);
        match queue.pop() {
            Some(PlayerMessage::Engine(EngineEvent::BufferingProgress(p))) => assert_eq!(p, 100),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_clear() {
        let queue = EventQueue::new();
        queue.push(PlayerMessage::Tick);
        queue.push(PlayerMessage::Tick);
        assert!(!queue.is_empty());
        queue.clear();
        assert!(queue.is_empty());
    }
}
