// Playback configuration
// Passed explicitly at set_source time; the controller reads these flags
// at its decision points and never consults process-global state.

use crate::engine::EngineKind;

/// How decoded frames are presented. Anything other than `Plane` requires
/// the software decode engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Regular flat rendering
    Plane,
    /// 360° panorama sphere
    Sphere,
    /// Side-by-side VR box rendering
    VrBox,
}

/// Per-source playback options.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Start playback as soon as the engine reports prepared
    pub is_auto_play: bool,

    /// Resume playback automatically after consumer-initiated seeks that
    /// come in through the transport bridge
    pub is_seeked_auto_play: bool,

    /// Ask the engine for sample-accurate (rather than keyframe) seeks
    pub is_accurate_seek: bool,

    /// Restart the source from the beginning when it ends
    pub is_loop_play: bool,

    /// Seconds of media the engine should keep buffered ahead of the
    /// playhead
    pub preferred_forward_buffer_duration: f64,

    /// Prefer hardware-accelerated codecs where the engine has them
    pub hardware_decode: bool,

    pub display: DisplayMode,

    /// Engine used by default
    pub first_engine: EngineKind,

    /// Engine substituted once after a recoverable decode failure; `None`
    /// disables fallback
    pub second_engine: Option<EngineKind>,

    /// Output is currently mirrored to a wireless casting route; forces
    /// the casting-capable platform engine
    pub wireless_route_active: bool,

    /// Wire the transport-command bridge for the lifetime of the source
    pub register_remote_commands: bool,

    /// Interval of the progress polling timer, in milliseconds
    pub progress_interval_ms: u64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            is_auto_play: true,
            is_seeked_auto_play: true,
            is_accurate_seek: false,
            is_loop_play: false,
            preferred_forward_buffer_duration: 3.0,
            hardware_decode: true,
            display: DisplayMode::Plane,
            first_engine: EngineKind::Platform,
            second_engine: None,
            wireless_route_active: false,
            register_remote_commands: true,
            progress_interval_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PlayerOptions::default();
        assert!(options.is_auto_play);
        assert!(options.is_seeked_auto_play);
        assert!(!options.is_accurate_seek);
        assert!(!options.is_loop_play);
        assert_eq!(options.preferred_forward_buffer_duration, 3.0);
        assert_eq!(options.display, DisplayMode::Plane);
        assert_eq!(options.first_engine, EngineKind::Platform);
        assert!(options.second_engine.is_none());
        assert_eq!(options.progress_interval_ms, 500);
    }
}
