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

//! Cooperation with the host's exclusive audio channel.
//!
//! [`AudioFocusArbiter`] asks the host for playback focus and turns focus
//! changes into [`FocusDirective`]s for the session. It never starts playback
//! on its own: it only resumes a play that an involuntary focus loss
//! interrupted.

use tracing::{debug, info, warn};

use crate::engine::EventSink;

/// What the audio stream is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AudioUsage {
    Media,
}

/// What kind of content the audio stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AudioContentType {
    Movie,
}

/// Attributes of a focus request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub usage:                 AudioUsage,
    pub content:               AudioContentType,
    pub accepts_delayed_grant: bool,
}

impl FocusRequest {
    /// The request used for movie playback.
    pub const fn movie_playback() -> Self {
        Self {
            usage:                 AudioUsage::Media,
            content:               AudioContentType::Movie,
            accepts_delayed_grant: true,
        }
    }
}

/// Immediate answer of the host to a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FocusGrant {
    Granted,
    /// Focus will be granted later through [`FocusChange::Gained`].
    Delayed,
    Denied,
}

/// Focus change reported by the host after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FocusChange {
    Gained,
    Lost,
    LostTransient,
}

/// Callback handed to the host with a focus request.
///
/// Changes are queued on the session event channel so they are handled on
/// the same serialized path as player events.
#[derive(Debug, Clone)]
pub struct FocusListener {
    sink: EventSink,
}

impl FocusListener {
    pub fn new(sink: EventSink) -> Self { Self { sink } }

    pub fn notify(&self, change: FocusChange) { self.sink.focus(change); }
}

/// Host audio-focus service.
pub trait AudioFocusService: Send {
    fn request(&mut self, request: &FocusRequest, listener: FocusListener) -> FocusGrant;

    fn abandon(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum FocusState {
    #[default]
    Idle,
    FocusHeld,
    FocusLostTransient,
}

/// What the session has to do with its player after a focus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirective {
    Keep,
    Pause,
    Resume,
}

pub struct AudioFocusArbiter<S> {
    service:                 S,
    sink:                    EventSink,
    state:                   FocusState,
    /// A request is outstanding, so focus changes concern our player.
    engaged:                 bool,
    was_playing_before_loss: bool,
}

impl<S: AudioFocusService> AudioFocusArbiter<S> {
    pub fn new(service: S, sink: EventSink) -> Self {
        Self {
            service,
            sink,
            state: FocusState::Idle,
            engaged: false,
            was_playing_before_loss: false,
        }
    }

    pub const fn state(&self) -> FocusState { self.state }

    pub const fn service(&self) -> &S { &self.service }

    /// Asks the host for playback focus.
    ///
    /// Anything but an immediate grant forces the player to pause.
    pub fn request_focus(&mut self) -> FocusDirective {
        if self.state == FocusState::FocusHeld {
            return FocusDirective::Keep;
        }

        let grant = self.service.request(
            &FocusRequest::movie_playback(),
            FocusListener::new(self.sink.clone()),
        );
        debug!(%grant, "audio focus requested");

        match grant {
            FocusGrant::Granted => {
                self.engaged = true;
                self.state = FocusState::FocusHeld;
                FocusDirective::Keep
            }
            FocusGrant::Delayed => {
                self.engaged = true;
                FocusDirective::Pause
            }
            FocusGrant::Denied => {
                warn!("audio focus denied, pausing playback");
                FocusDirective::Pause
            }
        }
    }

    /// Handles a focus change from the host.
    ///
    /// `is_playing` is the player state right before this change.
    pub fn on_focus_change(&mut self, change: FocusChange, is_playing: bool) -> FocusDirective {
        if !self.engaged {
            debug!(%change, "focus change ignored, no outstanding request");
            return FocusDirective::Keep;
        }

        match change {
            FocusChange::Lost | FocusChange::LostTransient => {
                // a repeated loss keeps the snapshot taken when focus was first lost
                if self.state != FocusState::FocusLostTransient {
                    self.was_playing_before_loss = is_playing;
                }
                info!(%change, is_playing, "audio focus lost");
                self.state = FocusState::FocusLostTransient;
                FocusDirective::Pause
            }
            FocusChange::Gained => {
                self.state = FocusState::FocusHeld;
                let resume = std::mem::take(&mut self.was_playing_before_loss);
                info!(resume, "audio focus regained");
                if resume {
                    FocusDirective::Resume
                } else {
                    FocusDirective::Keep
                }
            }
        }
    }

    /// Gives focus back to the host. Safe to call repeatedly.
    pub fn abandon_focus(&mut self) {
        if self.engaged {
            self.service.abandon();
            debug!("audio focus abandoned");
        }
        self.engaged = false;
        self.state = FocusState::Idle;
        self.was_playing_before_loss = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedFocusService;

    fn arbiter(grant: FocusGrant) -> AudioFocusArbiter<SimulatedFocusService> {
        let (sink, _rx) = EventSink::channel();
        AudioFocusArbiter::new(SimulatedFocusService::new(grant), sink)
    }

    #[test]
    fn granted_request_holds_focus() {
        let mut arbiter = arbiter(FocusGrant::Granted);
        assert_eq!(arbiter.request_focus(), FocusDirective::Keep);
        assert_eq!(arbiter.state(), FocusState::FocusHeld);
        assert_eq!(arbiter.service().requests(), 1);

        // already held, host is not asked again
        assert_eq!(arbiter.request_focus(), FocusDirective::Keep);
        assert_eq!(arbiter.service().requests(), 1);
    }

    #[test]
    fn denied_request_forces_pause() {
        let mut arbiter = arbiter(FocusGrant::Denied);
        assert_eq!(arbiter.request_focus(), FocusDirective::Pause);
        assert_eq!(arbiter.state(), FocusState::Idle);

        // nothing to react to after a denial
        assert_eq!(
            arbiter.on_focus_change(FocusChange::LostTransient, true),
            FocusDirective::Keep
        );
    }

    #[test]
    fn delayed_grant_pauses_then_holds_without_resuming() {
        let mut arbiter = arbiter(FocusGrant::Delayed);
        assert_eq!(arbiter.request_focus(), FocusDirective::Pause);
        assert_eq!(arbiter.state(), FocusState::Idle);

        assert_eq!(
            arbiter.on_focus_change(FocusChange::Gained, false),
            FocusDirective::Keep
        );
        assert_eq!(arbiter.state(), FocusState::FocusHeld);
    }

    #[test]
    fn regain_resumes_only_if_playing_at_loss() {
        let mut arbiter = arbiter(FocusGrant::Granted);
        arbiter.request_focus();

        assert_eq!(
            arbiter.on_focus_change(FocusChange::LostTransient, true),
            FocusDirective::Pause
        );
        assert_eq!(arbiter.state(), FocusState::FocusLostTransient);
        assert_eq!(
            arbiter.on_focus_change(FocusChange::Gained, false),
            FocusDirective::Resume
        );
        assert_eq!(arbiter.state(), FocusState::FocusHeld);

        assert_eq!(
            arbiter.on_focus_change(FocusChange::Lost, false),
            FocusDirective::Pause
        );
        assert_eq!(
            arbiter.on_focus_change(FocusChange::Gained, false),
            FocusDirective::Keep
        );
    }

    #[test]
    fn repeated_loss_keeps_first_snapshot() {
        let mut arbiter = arbiter(FocusGrant::Granted);
        arbiter.request_focus();

        assert_eq!(
            arbiter.on_focus_change(FocusChange::LostTransient, true),
            FocusDirective::Pause
        );
        // the player is paused by now
        assert_eq!(
            arbiter.on_focus_change(FocusChange::LostTransient, false),
            FocusDirective::Pause
        );
        assert_eq!(
            arbiter.on_focus_change(FocusChange::Lost, false),
            FocusDirective::Pause
        );
        assert_eq!(
            arbiter.on_focus_change(FocusChange::Gained, false),
            FocusDirective::Resume
        );
    }

    #[test]
    fn abandon_is_idempotent_and_clears_snapshot() {
        let mut arbiter = arbiter(FocusGrant::Granted);
        arbiter.request_focus();
        arbiter.on_focus_change(FocusChange::LostTransient, true);

        arbiter.abandon_focus();
        arbiter.abandon_focus();
        assert_eq!(arbiter.state(), FocusState::Idle);
        assert_eq!(arbiter.service().abandons(), 1);

        assert_eq!(
            arbiter.on_focus_change(FocusChange::Gained, false),
            FocusDirective::Keep
        );
    }
}
