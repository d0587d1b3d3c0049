//! In-memory state owned by a playback session.
//!
//! Per-item playback records, the user-facing session config and the
//! playback status mirrored for the UI.

mod playback_status;
mod session_config;
mod video_state;

pub use playback_status::{PlaybackStatus, format_time};
pub use session_config::SessionConfig;
pub use video_state::{VideoPlaybackRecord, VideoStateStore};
