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

//! Media descriptions handed to the playback engine.

use serde::{Deserialize, Serialize};

/// Side-loaded subtitle file attached to a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct SubtitleTrack {
    /// Location of the subtitle file
    pub uri:       String,
    /// BCP-47 language tag, e.g. `en`
    pub language:  String,
    /// MIME type such as `application/ttml+xml`
    pub mime_type: String,
}

/// One entry of the playback queue.
///
/// Immutable once built; the identifier keys the per-item playback record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct MediaItem {
    /// Identifier, unique within a session
    pub id:         String,
    /// Location of the media stream
    pub source_uri: String,
    pub subtitle:   Option<SubtitleTrack>,
}

impl MediaItem {
    pub const fn has_subtitle(&self) -> bool { self.subtitle.is_some() }
}

/// Kind of elementary stream a track group carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum TrackType {
    Video,
    Audio,
    Text,
}

/// A group of alternative tracks of one type, as exposed by the engine for
/// the current item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroup {
    /// Engine-assigned group identifier
    pub id:          String,
    pub track_type:  TrackType,
    /// Number of selectable tracks in this group
    pub track_count: usize,
}

/// Forces the engine to select specific tracks of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelectionOverride {
    pub group_id:      String,
    pub track_type:    TrackType,
    pub track_indices: Vec<usize>,
}

impl TrackSelectionOverride {
    /// Override selecting the first track of `group`.
    pub fn first_of(group: &TrackGroup) -> Self {
        Self {
            group_id:      group.id.clone(),
            track_type:    group.track_type,
            track_indices: vec![0],
        }
    }
}
