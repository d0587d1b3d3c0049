/// Per-item playback progress, keyed by media identifier.
///
/// Records are seeded for every queued item when a session is built and are
/// never removed while the session lives.

use std::{collections::HashMap, time::Duration};

use crate::media::MediaItem;

/// Progress and capabilities of one media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoPlaybackRecord {
    /// Last recorded playback position
    pub current_position:   Duration,
    /// Item duration, zero until the engine reports it
    pub total_duration:     Duration,
    /// Whether the item ships a subtitle track. Fixed at creation.
    pub captions_available: bool,
}

impl VideoPlaybackRecord {
    pub const fn new(captions_available: bool) -> Self {
        Self {
            current_position: Duration::ZERO,
            total_duration: Duration::ZERO,
            captions_available,
        }
    }

    /// Time left until the end; zero when the position is past the duration.
    pub const fn remaining(&self) -> Duration {
        self.total_duration.saturating_sub(self.current_position)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoStateStore {
    records: HashMap<String, VideoPlaybackRecord>,
}

impl VideoStateStore {
    pub fn new() -> Self { Self::default() }

    /// Creates one fresh record per item.
    pub fn seed<'a>(&mut self, items: impl IntoIterator<Item = &'a MediaItem>) {
        for item in items {
            self.records
                .insert(item.id.clone(), VideoPlaybackRecord::new(item.has_subtitle()));
        }
    }

    pub fn get(&self, id: &str) -> Option<&VideoPlaybackRecord> { self.records.get(id) }

    /// Position to resume `id` from, zero for unknown items.
    pub fn resume_position(&self, id: &str) -> Duration {
        self.records
            .get(id)
            .map_or(Duration::ZERO, |r| r.current_position)
    }

    pub fn captions_available(&self, id: &str) -> bool {
        self.records.get(id).is_some_and(|r| r.captions_available)
    }

    /// Stores the latest position tick for `id`.
    ///
    /// A tick for an id that was never seeded creates a record without
    /// captions instead of being dropped.
    pub fn record_position(&mut self, id: &str, position: Duration, duration: Duration) {
        let record = self
            .records
            .entry(id.to_owned())
            .or_insert_with(|| VideoPlaybackRecord::new(false));
        record.current_position = position;
        record.total_duration = duration;
    }

    /// Rewinds the stored position of `id` to zero when at most `threshold`
    /// was left. Returns whether the record was reset.
    pub fn reset_if_nearly_finished(&mut self, id: &str, threshold: Duration) -> bool {
        match self.records.get_mut(id) {
            Some(record) if record.remaining() <= threshold => {
                record.current_position = Duration::ZERO;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn clear(&mut self) { self.records.clear(); }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoPlaybackRecord)> {
        self.records.iter().map(|(id, r)| (id.as_str(), r))
    }
}
