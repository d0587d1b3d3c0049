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

//! Boundary to the media playback engine.
//!
//! The engine does decoding, buffering and rendering. The session core only
//! drives it through [`MediaEngine`] and learns about its progress through
//! [`PlayerEvent`]s pushed into an [`EventSink`].

use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    focus::FocusChange,
    media::{MediaItem, TrackGroup, TrackSelectionOverride, TrackType},
};

/// Coarse engine state, as reported by `PlaybackStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Everything the engine can tell the session about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current queue entry changed. `None` when the queue is exhausted.
    MediaItemTransition { index: Option<usize> },
    /// The set of available tracks for the current item changed.
    TracksChanged,
    IsPlayingChanged(bool),
    PlaybackStateChanged(PlaybackState),
    /// Text of the first active subtitle cue, empty when none.
    CuesChanged(String),
}

/// Events delivered to the session on its single event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Player(PlayerEvent),
    Focus(FocusChange),
}

pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Write end of the session event queue.
///
/// Sending never fails from the caller's point of view: once the session is
/// gone the event is dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    /// Creates the session event queue.
    pub fn channel() -> (Self, SessionEventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn player(&self, event: PlayerEvent) { self.send(SessionEvent::Player(event)); }

    pub fn focus(&self, change: FocusChange) { self.send(SessionEvent::Focus(change)); }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("session event dropped, receiver is gone");
        }
    }
}

/// Playback primitives the session needs from the engine.
///
/// All commands are fire-and-forget; their effect is observed later through
/// [`PlayerEvent`]s.
pub trait MediaEngine: Send {
    fn play(&mut self);

    fn pause(&mut self);

    /// Seeks within the current item.
    fn seek_to(&mut self, position: Duration);

    /// Seeks to `position` of the queue entry at `index`.
    fn seek_to_item(&mut self, index: usize, position: Duration);

    fn set_playback_speed(&mut self, speed: f32);

    fn current_position(&self) -> Duration;

    /// Duration of the current item, `None` while unknown.
    fn duration(&self) -> Option<Duration>;

    fn is_playing(&self) -> bool;

    fn is_loading(&self) -> bool;

    fn current_item_index(&self) -> Option<usize>;

    fn item_count(&self) -> usize;

    fn media_item_at(&self, index: usize) -> Option<&MediaItem>;

    /// Whether the engine can currently jump between queue entries.
    fn can_seek_to_item(&self) -> bool;

    fn has_next_item(&self) -> bool {
        self.current_item_index()
            .is_some_and(|idx| idx + 1 < self.item_count())
    }

    fn has_previous_item(&self) -> bool { self.current_item_index().is_some_and(|idx| idx > 0) }

    fn current_media_item(&self) -> Option<&MediaItem> {
        self.current_item_index()
            .and_then(|idx| self.media_item_at(idx))
    }

    /// Track groups of the current item.
    fn current_tracks(&self) -> Vec<TrackGroup>;

    fn clear_overrides(&mut self, track_type: TrackType);

    fn set_override(&mut self, track_override: TrackSelectionOverride);

    /// Frees decoder and network resources. Must be idempotent.
    fn release(&mut self);
}

/// Builds engines for new sessions.
pub trait EngineFactory: Send {
    type Engine: MediaEngine;

    /// Creates an engine loaded with `items`, reporting through `events`.
    fn create(&self, items: Vec<MediaItem>, events: EventSink) -> Self::Engine;
}
