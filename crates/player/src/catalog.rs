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

//! Sample queue used by the demo binary and the tests.

use crate::media::{MediaItem, SubtitleTrack};

const SAMPLE_BUCKET: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample";

const SUBTITLED_SOURCE: &str = "https://html5demos.com/assets/dizzy.mp4";
const SUBTITLED_TTML: &str =
    "https://storage.googleapis.com/exoplayer-test-media-1/ttml/netflix_ttml_sample.xml";

/// Four public sample films followed by one clip with an English TTML
/// subtitle track.
pub fn demo_items() -> Vec<MediaItem> {
    let films = [
        "BigBuckBunny.mp4",
        "ForBiggerBlazes.mp4",
        "ElephantsDream.mp4",
        "TearsOfSteel.mp4",
    ];

    let mut items: Vec<MediaItem> = films
        .iter()
        .enumerate()
        .map(|(i, file)| {
            MediaItem::builder()
                .id(format!("Video_{}", i + 1))
                .source_uri(format!("{SAMPLE_BUCKET}/{file}"))
                .build()
        })
        .collect();

    items.push(
        MediaItem::builder()
            .id("Video_5")
            .source_uri(SUBTITLED_SOURCE)
            .subtitle(
                SubtitleTrack::builder()
                    .uri(SUBTITLED_TTML)
                    .language("en")
                    .mime_type("application/ttml+xml")
                    .build(),
            )
            .build(),
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_last_item_has_subtitles() {
        let items = demo_items();
        assert_eq!(items.len(), 5);
        assert_eq!(
            items.iter().filter(|i| i.has_subtitle()).count(),
            1,
            "exactly one subtitled item expected"
        );
        assert_eq!(items[4].id, "Video_5");
        assert!(items[4].has_subtitle());
    }
}
