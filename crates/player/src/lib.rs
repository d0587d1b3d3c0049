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

//! Playback-session core of the playdeck video player.
//!
//! A session plays an ordered queue of [`MediaItem`]s through an external
//! [`MediaEngine`], remembers per-item progress, keeps subtitle selection in
//! line with the captions toggle and cooperates with the host's audio focus.

pub mod actions;
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod err;
pub mod focus;
pub mod lifecycle;
pub mod media;
pub mod session;
pub mod sim;
pub mod state;
pub mod subtitles;

pub use actions::PlayerAction;
pub use config::PlayerConfig;
pub use coordinator::{PlaybackSessionCoordinator, SessionView};
pub use engine::{EngineFactory, EventSink, MediaEngine, PlayerEvent, SessionEvent};
pub use focus::{AudioFocusArbiter, AudioFocusService, FocusChange, FocusGrant, FocusState};
pub use lifecycle::{HostLifecycleEvent, PipCapabilities, PipParams};
pub use media::{MediaItem, SubtitleTrack};
pub use session::{SessionCommand, SessionHandle, spawn_session};
