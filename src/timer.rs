// Progress polling timer
// A background thread enqueues Tick messages at a fixed interval while the
// timer is armed. Pausing playback disarms the timer without destroying
// it; only reset (or drop) stops the thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::events::{EventQueue, PlayerMessage};

/// Granularity of the shutdown/arm checks inside the tick thread
const TICK_POLL_MS: u64 = 10;

pub struct ProgressTimer {
    armed: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressTimer {
    /// Spawn the tick thread. The timer starts disarmed; no ticks are
    /// delivered until `arm()` is called.
    pub fn spawn(interval: Duration, queue: EventQueue) -> Self {
        let armed = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_armed = armed.clone();
        let thread_stop = stop.clone();

        let handle = thread::spawn(move || {
            log::debug!("progress timer started ({:?} interval)", interval);
            let mut next_fire = Instant::now() + interval;

            loop {
                if thread_stop.load(Ordering::Relaxed) {
                    break;
                }

                if Instant::now() >= next_fire {
                    if thread_armed.load(Ordering::Relaxed) {
                        queue.push(PlayerMessage::Tick);
                    }
                    next_fire = Instant::now() + interval;
                }

                thread::sleep(Duration::from_millis(TICK_POLL_MS));
            }

            log::debug!("progress timer exited");
        });

        Self {
            armed,
            stop,
            handle: Some(handle),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    /// Stop the tick thread and wait for it to exit
    pub fn invalidate(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressTimer {
    fn drop(&mut self) {
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarmed_timer_is_silent() {
        let queue = EventQueue::new();
        let mut timer = ProgressTimer::spawn(Duration::from_millis(20), queue.clone());

        thread::sleep(Duration::from_millis(100));
        assert!(queue.is_empty());
        timer.invalidate();
    }

    #[test]
    fn test_armed_timer_ticks() {
        let queue = EventQueue::new();
        let timer = ProgressTimer::spawn(Duration::from_millis(20), queue.clone());

        timer.arm();
        thread::sleep(Duration::from_millis(150));
        timer.disarm();

        assert!(!queue.is_empty());
        assert!(matches!(queue.pop(), Some(PlayerMessage::Tick)));
    }

    #[test]
    fn test_disarm_stops_ticks() {
        let queue = EventQueue::new();
        let mut timer = ProgressTimer::spawn(Duration::from_millis(20), queue.clone());

        timer.arm();
        thread::sleep(Duration::from_millis(80));
        timer.disarm();
        queue.clear();

        thread::sleep(Duration::from_millis(100));
        assert!(queue.is_empty());
        timer.invalidate();
    }

    #[test]
    fn test_invalidate_joins_thread() {
        let queue = EventQueue::new();
        let mut timer = ProgressTimer::spawn(Duration::from_millis(20), queue);
        timer.arm();
        timer.invalidate();
        assert!(timer.handle.is_none());
    }
}
