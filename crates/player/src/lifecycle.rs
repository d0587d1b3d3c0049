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

//! Host lifecycle and picture-in-picture decisions.
//!
//! These helpers only decide; calling into the host is left to the embedding
//! application.

use crate::actions::PlayerAction;

/// Lifecycle transitions of the surface hosting the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLifecycleEvent {
    Pause { in_picture_in_picture: bool },
    Resume,
    Stop,
}

impl HostLifecycleEvent {
    /// Action the session should take for this transition, if any.
    ///
    /// Playback keeps running when the surface pauses into
    /// picture-in-picture.
    pub const fn to_action(self) -> Option<PlayerAction> {
        match self {
            Self::Pause {
                in_picture_in_picture: true,
            } => None,
            Self::Pause { .. } | Self::Stop => Some(PlayerAction::Pause),
            Self::Resume => Some(PlayerAction::Play),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipCapabilities {
    /// The device has a picture-in-picture feature
    pub supported: bool,
    /// The user allows picture-in-picture for this app
    pub permitted: bool,
}

impl PipCapabilities {
    pub const fn should_enter_on_user_leave(&self) -> bool { self.supported && self.permitted }
}

/// Parameters for entering picture-in-picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipParams {
    pub aspect_width:  u32,
    pub aspect_height: u32,
}

impl Default for PipParams {
    fn default() -> Self {
        Self {
            aspect_width:  16,
            aspect_height: 9,
        }
    }
}
