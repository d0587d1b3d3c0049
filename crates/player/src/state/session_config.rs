/// Transient, user-controlled settings of a playback session.
///
/// Independent of any single media item; survives item transitions.

use smart_default::SmartDefault;

#[derive(Debug, Clone, Copy, PartialEq, SmartDefault)]
pub struct SessionConfig {
    /// Playback rate, always positive
    #[default = 1.0]
    pub playback_speed:   f32,
    /// Whether the on-screen controls are locked
    pub is_screen_locked: bool,
    /// Global captions toggle
    #[default = true]
    pub captions_on:      bool,
}

impl SessionConfig {
    pub fn with_captions(captions_on: bool) -> Self {
        Self {
            captions_on,
            ..Self::default()
        }
    }

    /// Next faster speed on `ladder`, if the current speed is on it and not
    /// already the fastest.
    pub fn step_faster(&self, ladder: &[f32]) -> Option<f32> {
        self.ladder_index(ladder)
            .and_then(|idx| ladder.get(idx + 1).copied())
    }

    /// Next slower speed on `ladder`, if the current speed is on it and not
    /// already the slowest.
    pub fn step_slower(&self, ladder: &[f32]) -> Option<f32> {
        self.ladder_index(ladder)
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| ladder.get(idx).copied())
    }

    fn ladder_index(&self, ladder: &[f32]) -> Option<usize> {
        ladder
            .iter()
            .position(|s| (s - self.playback_speed).abs() < f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLAYBACK_SPEEDS;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!((config.playback_speed - 1.0).abs() < f32::EPSILON);
        assert!(!config.is_screen_locked);
        assert!(config.captions_on);
        assert!(!SessionConfig::with_captions(false).captions_on);
    }

    #[test]
    fn steps_along_the_ladder() {
        let mut config = SessionConfig::default();
        assert_eq!(config.step_faster(&DEFAULT_PLAYBACK_SPEEDS), Some(1.5));
        assert_eq!(config.step_slower(&DEFAULT_PLAYBACK_SPEEDS), Some(0.5));

        config.playback_speed = 2.0;
        assert_eq!(config.step_faster(&DEFAULT_PLAYBACK_SPEEDS), None);

        config.playback_speed = 0.5;
        assert_eq!(config.step_slower(&DEFAULT_PLAYBACK_SPEEDS), None);

        config.playback_speed = 1.25;
        assert_eq!(config.step_faster(&DEFAULT_PLAYBACK_SPEEDS), None);
        assert_eq!(config.step_slower(&DEFAULT_PLAYBACK_SPEEDS), None);
    }
}
