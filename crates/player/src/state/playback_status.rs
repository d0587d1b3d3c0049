/// Playback status mirrored for the UI layer.
///
/// Refreshed from player events and from the periodic status tick.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub is_playing:         bool,
    pub is_buffering:       bool,
    pub position:           Duration,
    pub duration:           Duration,
    /// Identifier of the current queue entry
    pub current_item_id:    Option<String>,
    /// Whether the current item has a subtitle track
    pub captions_available: bool,
    /// Subtitle text to display; empty while captions are off
    pub cue_text:           String,
}

impl PlaybackStatus {
    /// Renders `"MM:SS : MM:SS"` for the timeline label.
    pub fn formatted_time(&self) -> String {
        format!(
            "{} : {}",
            format_time(self.position),
            format_time(self.duration)
        )
    }

    /// Progress as a fraction in `0.0..=1.0`.
    pub fn progress_fraction(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Formats a duration as zero-padded `MM:SS`; minutes are not wrapped into
/// hours.
pub fn format_time(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(Duration::ZERO), "00:00");
        assert_eq!(format_time(Duration::from_millis(61_999)), "01:01");
        assert_eq!(format_time(Duration::from_secs(596)), "09:56");
        assert_eq!(format_time(Duration::from_secs(3_725)), "62:05");
    }

    #[test]
    fn timeline_label_and_fraction() {
        let status = PlaybackStatus {
            position: Duration::from_secs(30),
            duration: Duration::from_secs(120),
            ..Default::default()
        };
        assert_eq!(status.formatted_time(), "00:30 : 02:00");
        assert!((status.progress_fraction() - 0.25).abs() < f32::EPSILON);
        assert!(PlaybackStatus::default().progress_fraction().abs() < f32::EPSILON);
    }
}
