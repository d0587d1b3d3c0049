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

//! The playback session.
//!
//! [`PlaybackSessionCoordinator`] owns the live engine handle, the per-item
//! playback records and the session config. User actions come in through
//! [`PlaybackSessionCoordinator::execute_action`], engine and focus events
//! through [`PlaybackSessionCoordinator::handle_event`]; both run on the
//! caller's context, so the owner must serialize them (see
//! [`crate::session`]).

use std::time::Duration;

use snafu::ensure;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    actions::PlayerAction,
    analytics::{AnalyticsEvent, log_event},
    config::PlayerConfig,
    engine::{EngineFactory, EventSink, MediaEngine, PlaybackState, PlayerEvent, SessionEvent},
    err::{InvalidPlaybackSpeedSnafu, Result},
    focus::{AudioFocusArbiter, AudioFocusService, FocusDirective, FocusState},
    media::MediaItem,
    state::{PlaybackStatus, SessionConfig, VideoStateStore},
    subtitles::apply_caption_policy,
};

/// What observers see of the live engine handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session_id:    Uuid,
    /// Identifiers of the queued items, in order
    pub item_ids:      Vec<String>,
    pub current_index: Option<usize>,
}

impl SessionView {
    pub fn current_item_id(&self) -> Option<&str> {
        self.current_index
            .and_then(|idx| self.item_ids.get(idx))
            .map(String::as_str)
    }
}

pub struct PlaybackSessionCoordinator<F, A>
where
    F: EngineFactory,
    A: AudioFocusService,
{
    id:            Uuid,
    factory:       F,
    focus:         AudioFocusArbiter<A>,
    config:        PlayerConfig,
    sink:          EventSink,
    engine:        Option<F::Engine>,
    released:      bool,
    /// Index the session currently considers active
    current_index: Option<usize>,
    store:         VideoStateStore,
    view_tx:       watch::Sender<Option<SessionView>>,
    config_tx:     watch::Sender<SessionConfig>,
    status_tx:     watch::Sender<PlaybackStatus>,
}

impl<F, A> PlaybackSessionCoordinator<F, A>
where
    F: EngineFactory,
    A: AudioFocusService,
{
    /// Creates an idle coordinator.
    ///
    /// `sink` must feed the queue the owner drains into
    /// [`handle_event`](Self::handle_event); engine and focus events are
    /// reported through it.
    pub fn new(factory: F, focus_service: A, config: PlayerConfig, sink: EventSink) -> Self {
        let session_config = SessionConfig::with_captions(config.captions_on);
        Self {
            id: Uuid::new_v4(),
            factory,
            focus: AudioFocusArbiter::new(focus_service, sink.clone()),
            config,
            sink,
            engine: None,
            released: false,
            current_index: None,
            store: VideoStateStore::new(),
            view_tx: watch::Sender::new(None),
            config_tx: watch::Sender::new(session_config),
            status_tx: watch::Sender::new(PlaybackStatus::default()),
        }
    }

    pub const fn session_id(&self) -> Uuid { self.id }

    pub const fn config(&self) -> &PlayerConfig { &self.config }

    pub const fn store(&self) -> &VideoStateStore { &self.store }

    pub const fn engine(&self) -> Option<&F::Engine> { self.engine.as_ref() }

    pub const fn is_active(&self) -> bool { self.engine.is_some() }

    pub const fn focus_state(&self) -> FocusState { self.focus.state() }

    pub const fn focus_service(&self) -> &A { self.focus.service() }

    pub fn session_config(&self) -> SessionConfig { *self.config_tx.borrow() }

    pub fn status(&self) -> PlaybackStatus { self.status_tx.borrow().clone() }

    pub fn subscribe_view(&self) -> watch::Receiver<Option<SessionView>> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_config(&self) -> watch::Receiver<SessionConfig> { self.config_tx.subscribe() }

    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    /// Whether `id` ships a subtitle track. False for unknown items.
    pub fn is_captions_available(&self, id: &str) -> bool { self.store.captions_available(id) }

    /// Starts the session over `items`.
    ///
    /// Does nothing when a session is already live or this coordinator has
    /// been released.
    pub fn build_session(&mut self, items: Vec<MediaItem>) {
        if self.engine.is_some() {
            debug!(session = %self.id, "session already built");
            return;
        }
        if self.released {
            warn!(session = %self.id, "build requested on a released session");
            return;
        }

        self.store.seed(&items);
        let item_ids = items.iter().map(|item| item.id.clone()).collect();
        let mut engine = self.factory.create(items, self.sink.clone());
        engine.set_playback_speed(self.config_tx.borrow().playback_speed);
        self.current_index = engine.current_item_index();

        if self.config.play_on_load {
            match self.focus.request_focus() {
                FocusDirective::Keep | FocusDirective::Resume => engine.play(),
                FocusDirective::Pause => engine.pause(),
            }
        }

        let view = SessionView {
            session_id: self.id,
            item_ids,
            current_index: self.current_index,
        };
        info!(
            session = %self.id,
            items = view.item_ids.len(),
            play_on_load = self.config.play_on_load,
            "playback session built"
        );
        self.engine = Some(engine);
        self.view_tx.send_replace(Some(view));
        self.sync_current_item();
        self.refresh_status();
        log_event(AnalyticsEvent::SessionBuilt);
    }

    /// Applies one user action. Actions needing the engine are ignored
    /// while no session is live.
    pub fn execute_action(&mut self, action: PlayerAction) {
        debug!(session = %self.id, %action, "executing action");
        match action {
            PlayerAction::Lock | PlayerAction::Unlock => {
                let locked = action == PlayerAction::Lock;
                self.config_tx.send_modify(|c| c.is_screen_locked = locked);
                log_event(if locked {
                    AnalyticsEvent::ActionLock
                } else {
                    AnalyticsEvent::ActionUnlock
                });
            }
            PlayerAction::Captions => self.toggle_captions(),
            PlayerAction::Settings => log_event(AnalyticsEvent::ActionSettings),
            PlayerAction::Play => self.play(),
            PlayerAction::Pause => self.pause(),
            PlayerAction::Rewind => self.seek_by(false),
            PlayerAction::Forward => self.seek_by(true),
            PlayerAction::Seek(target) => self.seek(target),
            PlayerAction::Next => self.skip(true),
            PlayerAction::Previous => self.skip(false),
        }
    }

    /// Sets the playback speed for the rest of the session.
    pub fn set_playback_speed(&mut self, speed: f32) -> Result<()> {
        ensure!(
            speed.is_finite() && speed > 0.0,
            InvalidPlaybackSpeedSnafu { speed }
        );
        self.config_tx.send_modify(|c| c.playback_speed = speed);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_playback_speed(speed);
        }
        info!(session = %self.id, speed, "playback speed changed");
        log_event(AnalyticsEvent::PlaybackSpeedChanged);
        Ok(())
    }

    /// Stores a position tick for `id`.
    pub fn record_position(&mut self, id: &str, position: Duration, duration: Duration) {
        self.store.record_position(id, position, duration);
    }

    /// Records the engine's position for the current item. Skipped while the
    /// duration is still unknown.
    pub fn tick_position(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let (Some(item), Some(duration)) = (engine.current_media_item(), engine.duration()) else {
            return;
        };
        let id = item.id.clone();
        let position = engine.current_position();
        self.store.record_position(&id, position, duration);
        trace!(%id, ?position, "position recorded");
    }

    /// Samples position, duration and play state from the engine into the
    /// status channel.
    pub fn refresh_status(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let position = engine.current_position();
        let duration = engine.duration().unwrap_or_default();
        let is_playing = engine.is_playing();
        self.status_tx.send_if_modified(|status| {
            let changed = status.position != position
                || status.duration != duration
                || status.is_playing != is_playing;
            status.position = position;
            status.duration = duration;
            status.is_playing = is_playing;
            changed
        });
    }

    /// Handles an engine or focus event. Events arriving without a live
    /// session are dropped.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.engine.is_none() {
            trace!(?event, "event ignored, no live session");
            return;
        }
        match event {
            SessionEvent::Player(event) => self.on_player_event(event),
            SessionEvent::Focus(change) => {
                let is_playing = self.engine.as_ref().is_some_and(MediaEngine::is_playing);
                let directive = self.focus.on_focus_change(change, is_playing);
                self.apply_directive(directive);
            }
        }
    }

    /// Tears the session down. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.focus.abandon_focus();
        self.released = true;
        let Some(mut engine) = self.engine.take() else {
            return;
        };
        engine.release();
        self.store.clear();
        self.current_index = None;
        self.view_tx.send_replace(None);
        self.status_tx.send_modify(|status| {
            status.is_playing = false;
            status.is_buffering = false;
        });
        info!(session = %self.id, "playback session released");
        log_event(AnalyticsEvent::SessionReleased);
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::MediaItemTransition { index } => self.on_transition(index),
            PlayerEvent::TracksChanged => self.apply_captions(),
            PlayerEvent::IsPlayingChanged(is_playing) => {
                self.status_tx.send_modify(|s| s.is_playing = is_playing);
            }
            PlayerEvent::PlaybackStateChanged(state) => {
                let duration = self
                    .engine
                    .as_ref()
                    .and_then(MediaEngine::duration)
                    .unwrap_or_default();
                self.status_tx.send_modify(|s| {
                    s.is_buffering = state == PlaybackState::Buffering;
                    s.duration = duration;
                });
                debug!(%state, "playback state changed");
            }
            PlayerEvent::CuesChanged(text) => {
                let captions_on = self.config_tx.borrow().captions_on;
                self.status_tx.send_modify(|s| {
                    s.cue_text = if captions_on { text } else { String::new() };
                });
            }
        }
    }

    fn on_transition(&mut self, index: Option<usize>) {
        let left = std::mem::replace(&mut self.current_index, index);
        let left_id = left
            .filter(|&left| Some(left) != index)
            .and_then(|left| self.engine.as_ref()?.media_item_at(left))
            .map(|item| item.id.clone());

        if let Some(id) = left_id {
            let threshold = self.config.near_end_threshold();
            if self.store.reset_if_nearly_finished(&id, threshold) {
                debug!(%id, "left item was nearly finished, progress reset");
            }
        }

        self.view_tx.send_modify(|view| {
            if let Some(view) = view {
                view.current_index = index;
            }
        });
        self.sync_current_item();
        self.refresh_status();
        debug!(session = %self.id, ?left, ?index, "media item transition");
    }

    /// Mirrors the identity and caption capability of the current item into
    /// the status channel.
    fn sync_current_item(&mut self) {
        let id = self
            .engine
            .as_ref()
            .and_then(MediaEngine::current_media_item)
            .map(|item| item.id.clone());
        let captions_available = id
            .as_deref()
            .is_some_and(|id| self.store.captions_available(id));
        self.status_tx.send_modify(|s| {
            if s.current_item_id != id {
                s.cue_text.clear();
            }
            s.current_item_id = id;
            s.captions_available = captions_available;
        });
    }

    fn apply_captions(&mut self) {
        let captions_on = self.config_tx.borrow().captions_on;
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let captions_available = engine
            .current_media_item()
            .is_some_and(|item| self.store.captions_available(&item.id));
        apply_caption_policy(engine, captions_available, captions_on);
    }

    fn toggle_captions(&mut self) {
        self.config_tx.send_modify(|c| c.captions_on = !c.captions_on);
        let captions_on = self.config_tx.borrow().captions_on;
        if !captions_on {
            self.status_tx.send_modify(|s| s.cue_text.clear());
        }
        self.apply_captions();
        info!(session = %self.id, captions_on, "captions toggled");
        log_event(AnalyticsEvent::ActionCaptions);
    }

    fn play(&mut self) {
        if self.engine.is_none() {
            return;
        }
        let directive = self.focus.request_focus();
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match directive {
            FocusDirective::Keep | FocusDirective::Resume => engine.play(),
            FocusDirective::Pause => engine.pause(),
        }
        log_event(AnalyticsEvent::ActionPlay);
    }

    fn pause(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.pause();
        self.focus.abandon_focus();
        log_event(AnalyticsEvent::ActionPause);
    }

    fn seek_by(&mut self, forward: bool) {
        let step = self.config.seek_step();
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let position = engine.current_position();
        if forward {
            let Some(duration) = engine.duration() else {
                debug!("forward ignored, duration unknown");
                return;
            };
            engine.seek_to(position.saturating_add(step).min(duration));
            log_event(AnalyticsEvent::ActionForward);
        } else {
            engine.seek_to(position.saturating_sub(step));
            log_event(AnalyticsEvent::ActionRewind);
        }
    }

    fn seek(&mut self, target: Option<Duration>) {
        let Some(target) = target else {
            debug!("seek without a target ignored");
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let target = engine.duration().map_or(target, |d| target.min(d));
        engine.seek_to(target);
        log_event(AnalyticsEvent::ActionSeek);
    }

    /// Moves to the neighbouring queue entry, resuming from its stored
    /// position.
    fn skip(&mut self, forward: bool) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let allowed = if forward {
            engine.has_next_item()
        } else {
            engine.has_previous_item() && engine.can_seek_to_item()
        };
        let Some(current) = engine.current_item_index().filter(|_| allowed) else {
            debug!(forward, "no neighbouring item to skip to");
            return;
        };

        let target = if forward { current + 1 } else { current - 1 };
        let resume_at = engine
            .media_item_at(target)
            .map_or(Duration::ZERO, |item| self.store.resume_position(&item.id));
        engine.seek_to_item(target, resume_at);
        debug!(target, ?resume_at, "skipping to queue entry");
        log_event(if forward {
            AnalyticsEvent::ActionNext
        } else {
            AnalyticsEvent::ActionPrevious
        });
    }

    fn apply_directive(&mut self, directive: FocusDirective) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match directive {
            FocusDirective::Keep => {}
            FocusDirective::Pause => engine.pause(),
            FocusDirective::Resume => engine.play(),
        }
    }
}

impl<F, A> Drop for PlaybackSessionCoordinator<F, A>
where
    F: EngineFactory,
    A: AudioFocusService,
{
    fn drop(&mut self) { self.release(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog,
        engine::SessionEventReceiver,
        focus::FocusGrant,
        sim::{SimulatedFactory, SimulatedFocusService},
    };

    type SimCoordinator = PlaybackSessionCoordinator<SimulatedFactory, SimulatedFocusService>;

    fn coordinator(grant: FocusGrant) -> (SimCoordinator, SessionEventReceiver) {
        let (sink, rx) = EventSink::channel();
        let coordinator = PlaybackSessionCoordinator::new(
            SimulatedFactory::default(),
            SimulatedFocusService::new(grant),
            PlayerConfig::default(),
            sink,
        );
        (coordinator, rx)
    }

    fn drain(coordinator: &mut SimCoordinator, rx: &mut SessionEventReceiver) {
        while let Ok(event) = rx.try_recv() {
            coordinator.handle_event(event);
        }
    }

    #[test]
    fn build_seeds_records_and_is_idempotent() {
        let (mut coordinator, mut rx) = coordinator(FocusGrant::Granted);
        coordinator.build_session(catalog::demo_items());
        drain(&mut coordinator, &mut rx);

        assert_eq!(coordinator.store().len(), 5);
        assert!(coordinator.is_captions_available("Video_5"));
        assert!(!coordinator.is_captions_available("Video_1"));
        assert!(!coordinator.is_captions_available("unknown"));
        assert!(coordinator.status().is_playing);
        assert_eq!(coordinator.focus_state(), FocusState::FocusHeld);

        coordinator.build_session(catalog::demo_items());
        assert_eq!(coordinator.focus_service().requests(), 1);
        assert_eq!(
            coordinator
                .subscribe_view()
                .borrow()
                .as_ref()
                .and_then(SessionView::current_item_id),
            Some("Video_1")
        );
    }

    #[test]
    fn lock_and_speed_update_session_config() {
        let (mut coordinator, _rx) = coordinator(FocusGrant::Granted);
        coordinator.execute_action(PlayerAction::Lock);
        assert!(coordinator.session_config().is_screen_locked);
        coordinator.execute_action(PlayerAction::Unlock);
        assert!(!coordinator.session_config().is_screen_locked);

        coordinator.set_playback_speed(1.5).unwrap();
        assert!((coordinator.session_config().playback_speed - 1.5).abs() < f32::EPSILON);
        assert!(coordinator.set_playback_speed(0.0).is_err());
        assert!(coordinator.set_playback_speed(f32::NAN).is_err());
        assert!((coordinator.session_config().playback_speed - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn actions_without_session_are_ignored() {
        let (mut coordinator, _rx) = coordinator(FocusGrant::Granted);
        coordinator.execute_action(PlayerAction::Play);
        coordinator.execute_action(PlayerAction::Next);
        coordinator.handle_event(SessionEvent::Player(PlayerEvent::TracksChanged));
        assert!(!coordinator.is_active());
        assert!(!coordinator.status().is_playing);
    }

    #[test]
    fn release_is_idempotent_and_final() {
        let (mut coordinator, mut rx) = coordinator(FocusGrant::Granted);
        coordinator.build_session(catalog::demo_items());
        let sim = coordinator.engine().map(|e| e.controller()).unwrap();

        coordinator.release();
        coordinator.release();
        assert!(sim.is_released());
        assert_eq!(coordinator.focus_service().abandons(), 1);
        assert!(coordinator.subscribe_view().borrow().is_none());
        assert!(coordinator.store().is_empty());

        // late events and rebuilds are ignored
        drain(&mut coordinator, &mut rx);
        coordinator.build_session(catalog::demo_items());
        assert!(!coordinator.is_active());
    }

    #[test]
    fn forward_at_end_of_unbounded_item_saturates() {
        let (sink, mut rx) = EventSink::channel();
        let mut coordinator = PlaybackSessionCoordinator::new(
            SimulatedFactory::default().with_default_duration(Duration::MAX),
            SimulatedFocusService::new(FocusGrant::Granted),
            PlayerConfig::default(),
            sink,
        );
        coordinator.build_session(catalog::demo_items());
        drain(&mut coordinator, &mut rx);
        let sim = coordinator.engine().map(|e| e.controller()).unwrap();

        coordinator.execute_action(PlayerAction::Seek(Some(Duration::MAX)));
        coordinator.execute_action(PlayerAction::Forward);
        assert_eq!(sim.position(), Duration::MAX);
    }

    #[test]
    fn cues_hidden_while_captions_off() {
        let (mut coordinator, mut rx) = coordinator(FocusGrant::Granted);
        coordinator.build_session(catalog::demo_items());
        drain(&mut coordinator, &mut rx);

        coordinator.handle_event(SessionEvent::Player(PlayerEvent::CuesChanged(
            "hello".into(),
        )));
        assert_eq!(coordinator.status().cue_text, "hello");

        coordinator.execute_action(PlayerAction::Captions);
        assert!(coordinator.status().cue_text.is_empty());
        coordinator.handle_event(SessionEvent::Player(PlayerEvent::CuesChanged(
            "again".into(),
        )));
        assert!(coordinator.status().cue_text.is_empty());
    }
}
