// Playback controller state machine

use std::fmt;

/// Controller states over one playback session.
///
/// `NotSetUrl` is the initial state and the state after `reset()`. The two
/// "playing" states differ only in whether the engine currently has enough
/// data buffered to keep rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No source set yet (or controller was reset)
    NotSetUrl,
    /// Engine finished preparing; playback has not been requested
    ReadyToPlay,
    /// Playback requested but the engine is (re)filling its buffers
    Buffering,
    /// Playing with enough data buffered
    BufferFinished,
    /// Paused by the consumer
    Paused,
    /// Source played through to its end
    PlayedToTheEnd,
    /// Terminal engine failure
    Error,
}

impl PlayerState {
    /// Playback is considered active exactly in the two buffering-related
    /// states.
    pub fn is_playing(self) -> bool {
        self == PlayerState::Buffering || self == PlayerState::BufferFinished
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PlayerState::NotSetUrl => "notSetUrl",
            PlayerState::ReadyToPlay => "readyToPlay",
            PlayerState::Buffering => "buffering",
            PlayerState::BufferFinished => "bufferFinished",
            PlayerState::Paused => "paused",
            PlayerState::PlayedToTheEnd => "playedToTheEnd",
            PlayerState::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Whether `from -> to` is a transition the controller can legitimately
/// perform. Used for diagnostics: the controller logs (but does not block)
/// transitions outside this table, since engine callbacks can arrive in
/// orders the table's author did not anticipate.
pub fn is_valid_transition(from: PlayerState, to: PlayerState) -> bool {
    use PlayerState::*;

    if from == to {
        return true;
    }

    // Reset, terminal failure and end-of-media can interrupt anything:
    // reset() is unconditional, and an engine may report finish at any
    // point of its async lifecycle.
    if to == NotSetUrl || to == Error || to == PlayedToTheEnd {
        return true;
    }

    match (from, to) {
        // From NotSetUrl: prepared callback, or play() before prepared
        (NotSetUrl, ReadyToPlay) => true,
        (NotSetUrl, Buffering) => true,

        // From ReadyToPlay
        (ReadyToPlay, Buffering) => true,
        (ReadyToPlay, BufferFinished) => true,
        (ReadyToPlay, Paused) => true,

        // From Buffering: prepared may arrive after an eager play()
        (Buffering, BufferFinished) => true,
        (Buffering, ReadyToPlay) => true,
        (Buffering, Paused) => true,

        // From BufferFinished
        (BufferFinished, Buffering) => true,
        (BufferFinished, Paused) => true,

        // From Paused
        (Paused, Buffering) => true,
        (Paused, BufferFinished) => true,

        // From Error: play() retries prepare on the current engine
        (Error, ReadyToPlay) => true,
        (Error, Buffering) => true,
        (Error, BufferFinished) => true,

        // From PlayedToTheEnd: replay
        (PlayedToTheEnd, Buffering) => true,
        (PlayedToTheEnd, BufferFinished) => true,
        (PlayedToTheEnd, Paused) => true,

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerState::*;

    const ALL: [PlayerState; 7] = [
        NotSetUrl,
        ReadyToPlay,
        Buffering,
        BufferFinished,
        Paused,
        PlayedToTheEnd,
        Error,
    ];

    #[test]
    fn test_is_playing_invariant() {
        for state in ALL {
            let expected = state == Buffering || state == BufferFinished;
            assert_eq!(state.is_playing(), expected, "{}", state);
        }
    }

    #[test]
    fn test_reset_allowed_from_everywhere() {
        for state in ALL {
            assert!(is_valid_transition(state, NotSetUrl), "{} -> notSetUrl", state);
        }
    }

    #[test]
    fn test_error_and_end_allowed_from_everywhere() {
        for state in ALL {
            assert!(is_valid_transition(state, Error));
            assert!(is_valid_transition(state, PlayedToTheEnd));
        }
    }

    #[test]
    fn test_playback_cycle() {
        assert!(is_valid_transition(NotSetUrl, ReadyToPlay));
        assert!(is_valid_transition(ReadyToPlay, Buffering));
        assert!(is_valid_transition(Buffering, BufferFinished));
        assert!(is_valid_transition(BufferFinished, Buffering));
        assert!(is_valid_transition(BufferFinished, Paused));
        assert!(is_valid_transition(Paused, BufferFinished));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!is_valid_transition(NotSetUrl, Paused));
        assert!(!is_valid_transition(NotSetUrl, BufferFinished));
        assert!(!is_valid_transition(Paused, ReadyToPlay));
        assert!(!is_valid_transition(BufferFinished, ReadyToPlay));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(NotSetUrl.to_string(), "notSetUrl");
        assert_eq!(BufferFinished.to_string(), "bufferFinished");
    }
}
