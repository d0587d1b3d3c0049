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

use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Playback speed must be a positive finite number, got {speed}"))]
    InvalidPlaybackSpeed {
        speed: f32,
        #[snafu(implicit)]
        loc:   snafu::Location,
    },

    #[snafu(display("Invalid player configuration: {message}"))]
    InvalidConfig {
        message: String,
        #[snafu(implicit)]
        loc:     snafu::Location,
    },

    #[snafu(display("Failed to read player config {}", path.display()))]
    ReadConfig {
        source: std::io::Error,
        path:   PathBuf,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to parse player config {}", path.display()))]
    ParseConfig {
        source: serde_json::Error,
        path:   PathBuf,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Playback session is closed"))]
    SessionClosed {
        #[snafu(implicit)]
        loc: snafu::Location,
    },
}
