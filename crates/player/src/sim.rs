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

//! In-process stand-ins for the media engine and the host focus service.
//!
//! Used by the demo binary and by tests. Both share their state behind an
//! `Arc<Mutex<_>>` so a controller handle can drive the clock, inject events
//! and inspect what the session did after the engine has been handed over.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    engine::{EngineFactory, EventSink, MediaEngine, PlaybackState, PlayerEvent},
    focus::{AudioFocusService, FocusChange, FocusGrant, FocusListener, FocusRequest},
    media::{MediaItem, TrackGroup, TrackSelectionOverride, TrackType},
};

/// Calls received by a [`SimulatedEngine`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Play,
    Pause,
    SeekTo(Duration),
    SeekToItem(usize, Duration),
    SetPlaybackSpeed(f32),
    ClearOverrides(TrackType),
    SetOverride(TrackSelectionOverride),
    Release,
}

#[derive(Debug)]
struct SimState {
    events:           EventSink,
    durations:        Vec<Duration>,
    index:            Option<usize>,
    position:         Duration,
    playing:          bool,
    loading:          bool,
    speed:            f32,
    can_seek_to_item: bool,
    text_override:    Option<TrackSelectionOverride>,
    released:         bool,
    calls:            Vec<EngineCall>,
}

impl SimState {
    fn duration(&self) -> Duration {
        self.index
            .and_then(|i| self.durations.get(i).copied())
            .unwrap_or_default()
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.events.player(PlayerEvent::IsPlayingChanged(playing));
        }
    }

    fn move_to(&mut self, index: usize, position: Duration) {
        if self.index != Some(index) {
            self.index = Some(index);
            self.position = Duration::ZERO;
            self.text_override = None;
            self.events.player(PlayerEvent::MediaItemTransition {
                index: Some(index),
            });
            self.events.player(PlayerEvent::TracksChanged);
        }
        self.position = position.min(self.duration());
    }
}

/// Deterministic engine whose clock only moves through
/// [`SimController::advance`].
#[derive(Debug)]
pub struct SimulatedEngine {
    items: Arc<[MediaItem]>,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedEngine {
    pub fn controller(&self) -> SimController {
        SimController {
            items: Arc::clone(&self.items),
            state: Arc::clone(&self.state),
        }
    }
}

impl MediaEngine for SimulatedEngine {
    fn play(&mut self) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Play);
        if !state.released {
            state.set_playing(true);
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Pause);
        if !state.released {
            state.set_playing(false);
        }
    }

    fn seek_to(&mut self, position: Duration) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SeekTo(position));
        state.position = position.min(state.duration());
    }

    fn seek_to_item(&mut self, index: usize, position: Duration) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SeekToItem(index, position));
        if index < self.items.len() && !state.released {
            state.move_to(index, position);
        }
    }

    fn set_playback_speed(&mut self, speed: f32) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SetPlaybackSpeed(speed));
        state.speed = speed;
    }

    fn current_position(&self) -> Duration { self.state.lock().position }

    fn duration(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.index.map(|_| state.duration())
    }

    fn is_playing(&self) -> bool { self.state.lock().playing }

    fn is_loading(&self) -> bool { self.state.lock().loading }

    fn current_item_index(&self) -> Option<usize> { self.state.lock().index }

    fn item_count(&self) -> usize { self.items.len() }

    fn media_item_at(&self, index: usize) -> Option<&MediaItem> { self.items.get(index) }

    fn can_seek_to_item(&self) -> bool { self.state.lock().can_seek_to_item }

    fn current_tracks(&self) -> Vec<TrackGroup> {
        let Some(item) = self.current_media_item() else {
            return Vec::new();
        };
        let mut groups = vec![
            TrackGroup {
                id:          format!("{}:video", item.id),
                track_type:  TrackType::Video,
                track_count: 1,
            },
            TrackGroup {
                id:          format!("{}:audio", item.id),
                track_type:  TrackType::Audio,
                track_count: 1,
            },
        ];
        if item.has_subtitle() {
            groups.push(TrackGroup {
                id:          format!("{}:text", item.id),
                track_type:  TrackType::Text,
                track_count: 1,
            });
        }
        groups
    }

    fn clear_overrides(&mut self, track_type: TrackType) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::ClearOverrides(track_type));
        if track_type == TrackType::Text {
            state.text_override = None;
        }
    }

    fn set_override(&mut self, track_override: TrackSelectionOverride) {
        let mut state = self.state.lock();
        state
            .calls
            .push(EngineCall::SetOverride(track_override.clone()));
        if track_override.track_type == TrackType::Text {
            state.text_override = Some(track_override);
        }
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        if state.released {
            return;
        }
        state.calls.push(EngineCall::Release);
        state.released = true;
        state.playing = false;
    }
}

/// Outside view of a [`SimulatedEngine`].
#[derive(Debug, Clone)]
pub struct SimController {
    items: Arc<[MediaItem]>,
    state: Arc<Mutex<SimState>>,
}

impl SimController {
    /// Moves the clock forward by `elapsed` wall time.
    ///
    /// Reaching the end of an item continues into the next queue entry, or
    /// ends playback after the last one.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        if !state.playing || state.released {
            return;
        }
        let Some(index) = state.index else {
            return;
        };

        let speed = state.speed;
        let scaled = if (speed - 1.0).abs() < f32::EPSILON {
            elapsed
        } else {
            elapsed.mul_f32(speed)
        };
        state.position += scaled;
        if state.position < state.duration() {
            return;
        }

        if index + 1 < self.items.len() {
            let overflow = state.position - state.duration();
            state.move_to(index + 1, overflow);
        } else {
            state.position = state.duration();
            state.set_playing(false);
            state
                .events
                .player(PlayerEvent::PlaybackStateChanged(PlaybackState::Ended));
        }
    }

    /// Simulates a subtitle cue becoming active.
    pub fn show_cue(&self, text: impl Into<String>) {
        self.state
            .lock()
            .events
            .player(PlayerEvent::CuesChanged(text.into()));
    }

    /// Simulates a rebuffer, reporting the state change.
    pub fn set_buffering(&self, buffering: bool) {
        let mut state = self.state.lock();
        state.loading = buffering;
        let reported = if buffering {
            PlaybackState::Buffering
        } else {
            PlaybackState::Ready
        };
        state
            .events
            .player(PlayerEvent::PlaybackStateChanged(reported));
    }

    pub fn set_can_seek_to_item(&self, can_seek: bool) {
        self.state.lock().can_seek_to_item = can_seek;
    }

    pub fn position(&self) -> Duration { self.state.lock().position }

    pub fn index(&self) -> Option<usize> { self.state.lock().index }

    pub fn current_item_id(&self) -> Option<String> {
        self.index()
            .and_then(|i| self.items.get(i))
            .map(|item| item.id.clone())
    }

    pub fn is_playing(&self) -> bool { self.state.lock().playing }

    pub fn speed(&self) -> f32 { self.state.lock().speed }

    pub fn text_override(&self) -> Option<TrackSelectionOverride> {
        self.state.lock().text_override.clone()
    }

    pub fn is_released(&self) -> bool { self.state.lock().released }

    pub fn calls(&self) -> Vec<EngineCall> { self.state.lock().calls.clone() }

    /// Number of `SeekTo`/`SeekToItem` calls received so far.
    pub fn seek_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, EngineCall::SeekTo(_) | EngineCall::SeekToItem(..)))
            .count()
    }
}

/// Creates [`SimulatedEngine`]s and remembers their controllers.
///
/// Clones share the list of created engines.
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    default_duration: Duration,
    durations:        HashMap<String, Duration>,
    can_seek_to_item: bool,
    created:          Arc<Mutex<Vec<SimController>>>,
}

impl Default for SimulatedFactory {
    fn default() -> Self {
        Self {
            default_duration: Duration::from_secs(60),
            durations:        HashMap::new(),
            can_seek_to_item: true,
            created:          Arc::default(),
        }
    }
}

impl SimulatedFactory {
    #[must_use]
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, id: impl Into<String>, duration: Duration) -> Self {
        self.durations.insert(id.into(), duration);
        self
    }

    /// Engines created from here on refuse to jump between queue entries.
    #[must_use]
    pub fn without_item_seeking(mut self) -> Self {
        self.can_seek_to_item = false;
        self
    }

    /// Controller of the most recently created engine.
    pub fn last_controller(&self) -> Option<SimController> { self.created.lock().last().cloned() }

    pub fn created_count(&self) -> usize { self.created.lock().len() }
}

impl EngineFactory for SimulatedFactory {
    type Engine = SimulatedEngine;

    fn create(&self, items: Vec<MediaItem>, events: EventSink) -> SimulatedEngine {
        let durations = items
            .iter()
            .map(|item| {
                self.durations
                    .get(&item.id)
                    .copied()
                    .unwrap_or(self.default_duration)
            })
            .collect();
        let index = if items.is_empty() { None } else { Some(0) };

        if index.is_some() {
            events.player(PlayerEvent::MediaItemTransition { index });
            events.player(PlayerEvent::TracksChanged);
            events.player(PlayerEvent::PlaybackStateChanged(PlaybackState::Ready));
        }

        let engine = SimulatedEngine {
            items: items.into(),
            state: Arc::new(Mutex::new(SimState {
                events,
                durations,
                index,
                position: Duration::ZERO,
                playing: false,
                loading: false,
                speed: 1.0,
                can_seek_to_item: self.can_seek_to_item,
                text_override: None,
                released: false,
                calls: Vec::new(),
            })),
        };
        self.created.lock().push(engine.controller());
        engine
    }
}

#[derive(Debug)]
struct FocusSimState {
    grant:    FocusGrant,
    listener: Option<FocusListener>,
    requests: usize,
    abandons: usize,
}

/// Host focus service answering every request with a configurable grant.
///
/// Clones share state, so a test can keep one to fire focus changes.
#[derive(Debug, Clone)]
pub struct SimulatedFocusService {
    state: Arc<Mutex<FocusSimState>>,
}

impl SimulatedFocusService {
    pub fn new(grant: FocusGrant) -> Self {
        Self {
            state: Arc::new(Mutex::new(FocusSimState {
                grant,
                listener: None,
                requests: 0,
                abandons: 0,
            })),
        }
    }

    pub fn set_grant(&self, grant: FocusGrant) { self.state.lock().grant = grant; }

    /// Delivers `change` to the listener of the outstanding request, if any.
    pub fn fire(&self, change: FocusChange) {
        let listener = self.state.lock().listener.clone();
        if let Some(listener) = listener {
            listener.notify(change);
        }
    }

    pub fn requests(&self) -> usize { self.state.lock().requests }

    pub fn abandons(&self) -> usize { self.state.lock().abandons }
}

impl Default for SimulatedFocusService {
    fn default() -> Self { Self::new(FocusGrant::Granted) }
}

impl AudioFocusService for SimulatedFocusService {
    fn request(&mut self, _request: &FocusRequest, listener: FocusListener) -> FocusGrant {
        let mut state = self.state.lock();
        state.requests += 1;
        if state.grant == FocusGrant::Denied {
            state.listener = None;
        } else {
            state.listener = Some(listener);
        }
        state.grant
    }

    fn abandon(&mut self) {
        let mut state = self.state.lock();
        state.abandons += 1;
        state.listener = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, engine::SessionEvent};

    #[test]
    fn clock_runs_into_next_item_and_ends() {
        let (sink, mut rx) = EventSink::channel();
        let factory = SimulatedFactory::default()
            .with_default_duration(Duration::from_secs(10))
            .without_item_seeking();
        let mut engine = factory.create(catalog::demo_items().into_iter().take(2).collect(), sink);
        let sim = engine.controller();
        assert!(!engine.can_seek_to_item());

        sim.advance(Duration::from_secs(5));
        assert_eq!(sim.position(), Duration::ZERO, "clock is stopped while paused");

        engine.play();
        sim.advance(Duration::from_secs(12));
        assert_eq!(sim.index(), Some(1));
        assert_eq!(sim.position(), Duration::from_secs(2));

        sim.advance(Duration::from_secs(9));
        assert!(!sim.is_playing());
        assert_eq!(sim.position(), Duration::from_secs(10));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&SessionEvent::Player(PlayerEvent::MediaItemTransition {
            index: Some(1),
        })));
        assert_eq!(
            events.last(),
            Some(&SessionEvent::Player(PlayerEvent::PlaybackStateChanged(
                PlaybackState::Ended
            )))
        );
        assert_eq!(factory.created_count(), 1);
    }

    #[test]
    fn release_is_recorded_once() {
        let (sink, _rx) = EventSink::channel();
        let mut engine = SimulatedFactory::default().create(catalog::demo_items(), sink);
        engine.release();
        engine.release();
        let sim = engine.controller();
        assert!(sim.is_released());
        assert_eq!(
            sim.calls()
                .iter()
                .filter(|c| **c == EngineCall::Release)
                .count(),
            1
        );
    }
}
