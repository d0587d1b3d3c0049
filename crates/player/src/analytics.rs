// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Named player events.
//!
//! Each event is written as an `INFO` record on the `playdeck::analytics`
//! target and counted in `playdeck_player_events_total`. Emitting never fails.

use std::sync::LazyLock;

use prometheus::{IntCounterVec, register_int_counter_vec};

pub const EVENT_LABEL: &str = "event";

pub static PLAYER_EVENTS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    register_int_counter_vec!(
        "playdeck_player_events_total",
        "Total number of named player events",
        &[EVENT_LABEL]
    )
    .ok()
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::IntoStaticStr,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum AnalyticsEvent {
    ActionPlay,
    ActionPause,
    ActionRewind,
    ActionForward,
    ActionNext,
    ActionPrevious,
    ActionSeek,
    ActionSettings,
    ActionLock,
    ActionUnlock,
    ActionCaptions,
    PlaybackSpeedChanged,
    SessionBuilt,
    SessionReleased,
}

pub fn log_event(event: AnalyticsEvent) {
    let name: &'static str = event.into();
    tracing::info!(target: "playdeck::analytics", event = name, "player event");
    if let Some(counter) = PLAYER_EVENTS.as_ref() {
        counter.with_label_values(&[name]).inc();
    }
}

/// Current count for `event`, zero when the counter is unavailable.
pub fn event_count(event: AnalyticsEvent) -> u64 {
    let name: &'static str = event.into();
    PLAYER_EVENTS
        .as_ref()
        .map_or(0, |counter| counter.with_label_values(&[name]).get())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_and_counting() {
        let names: Vec<String> = AnalyticsEvent::iter().map(|e| e.to_string()).collect();
        assert!(names.contains(&"action_unlock".to_string()));
        assert!(names.contains(&"playback_speed_changed".to_string()));

        let before = event_count(AnalyticsEvent::ActionSettings);
        log_event(AnalyticsEvent::ActionSettings);
        assert!(event_count(AnalyticsEvent::ActionSettings) > before);
    }
}
