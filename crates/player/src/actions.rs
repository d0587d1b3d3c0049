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

use std::time::Duration;

/// A discrete user intent dispatched to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PlayerAction {
    Play,
    Pause,
    Rewind,
    Forward,
    Next,
    Previous,
    /// Absolute seek within the current item; `None` is ignored.
    Seek(Option<Duration>),
    /// The user opened the settings surface. No player mutation.
    Settings,
    Lock,
    Unlock,
    Captions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        assert_eq!(PlayerAction::Play.to_string(), "play");
        assert_eq!(PlayerAction::Seek(None).to_string(), "seek");
        let name: &'static str = PlayerAction::Captions.into();
        assert_eq!(name, "captions");
    }
}
