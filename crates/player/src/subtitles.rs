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

//! Text-track selection for the active item.

use tracing::debug;

use crate::{
    engine::MediaEngine,
    media::{TrackSelectionOverride, TrackType},
};

/// Result of applying the caption policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionOutcome {
    /// Any text override was removed.
    Cleared,
    /// The first track of the text group is now forced on.
    Installed(TrackSelectionOverride),
    /// Captions are wanted but the engine exposes no text group yet.
    NoTextGroup,
}

/// Makes the engine's text-track override match the item capability and the
/// global captions toggle.
///
/// Clearing is idempotent; a missing text group is not an error.
pub fn apply_caption_policy<E: MediaEngine + ?Sized>(
    engine: &mut E,
    captions_available: bool,
    captions_on: bool,
) -> CaptionOutcome {
    if !(captions_available && captions_on) {
        engine.clear_overrides(TrackType::Text);
        debug!(captions_available, captions_on, "text override cleared");
        return CaptionOutcome::Cleared;
    }

    let Some(group) = engine
        .current_tracks()
        .into_iter()
        .find(|g| g.track_type == TrackType::Text)
    else {
        debug!("no text track group for current item");
        return CaptionOutcome::NoTextGroup;
    };

    let track_override = TrackSelectionOverride::first_of(&group);
    engine.set_override(track_override.clone());
    debug!(group = %group.id, "text override installed");
    CaptionOutcome::Installed(track_override)
}
