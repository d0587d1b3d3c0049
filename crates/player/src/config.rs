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

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use snafu::{ResultExt, ensure};

use crate::err::{InvalidConfigSnafu, ParseConfigSnafu, ReadConfigSnafu, Result};

/// Speeds offered by the playback-speed picker.
pub const DEFAULT_PLAYBACK_SPEEDS: [f32; 5] = [0.5, 1.0, 1.5, 1.75, 2.0];

/// Player session configuration
#[derive(Debug, Clone, PartialEq, SmartDefault, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct PlayerConfig {
    /// Step used by rewind and forward, in milliseconds
    #[default = 10_000]
    #[builder(default = 10_000, getter)]
    pub seek_step_ms: u64,

    /// Remaining time at or below which an item that is left counts as
    /// finished, in milliseconds
    #[default = 3_000]
    #[builder(default = 3_000, getter)]
    pub near_end_threshold_ms: u64,

    /// Start playback as soon as the session is built
    #[default = true]
    #[builder(default = true, getter)]
    pub play_on_load: bool,

    /// Cadence of position recording, in milliseconds
    #[default = 1_000]
    #[builder(default = 1_000, getter)]
    pub position_tick_ms: u64,

    /// Cadence of the UI-facing status refresh, in milliseconds
    #[default = 500]
    #[builder(default = 500, getter)]
    pub status_tick_ms: u64,

    /// Initial captions toggle
    #[default = true]
    #[builder(default = true, getter)]
    pub captions_on: bool,

    /// Ladder of selectable playback speeds, ascending
    #[default(_code = "DEFAULT_PLAYBACK_SPEEDS.to_vec()")]
    #[builder(default = DEFAULT_PLAYBACK_SPEEDS.to_vec(), getter)]
    pub playback_speeds: Vec<f32>,
}

impl PlayerConfig {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).context(ReadConfigSnafu { path })?;
        let config: Self = serde_json::from_str(&raw).context(ParseConfigSnafu { path })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.position_tick_ms > 0 && self.status_tick_ms > 0,
            InvalidConfigSnafu {
                message: "tick periods must be non-zero",
            }
        );
        ensure!(
            !self.playback_speeds.is_empty(),
            InvalidConfigSnafu {
                message: "playback speed ladder is empty",
            }
        );
        ensure!(
            self.playback_speeds
                .iter()
                .all(|s| s.is_finite() && *s > 0.0),
            InvalidConfigSnafu {
                message: "playback speeds must be positive",
            }
        );
        ensure!(
            self.playback_speeds.windows(2).all(|w| w[0] < w[1]),
            InvalidConfigSnafu {
                message: "playback speed ladder must be strictly ascending",
            }
        );
        Ok(())
    }

    pub const fn seek_step(&self) -> Duration { Duration::from_millis(self.seek_step_ms) }

    pub const fn near_end_threshold(&self) -> Duration {
        Duration::from_millis(self.near_end_threshold_ms)
    }

    pub const fn position_tick(&self) -> Duration { Duration::from_millis(self.position_tick_ms) }

    pub const fn status_tick(&self) -> Duration { Duration::from_millis(self.status_tick_ms) }
}
