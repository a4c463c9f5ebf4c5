use std::collections::HashMap;

/// Watched channel → last-notified video id. Owned by the scan task alone;
/// starting empty after a restart is deliberate (first observation per
/// channel primes the entry instead of notifying).
#[derive(Debug, Default)]
pub struct LastSeenCache {
    entries: HashMap<String, String>,
}

impl LastSeenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self, channel_id: &str) -> Option<&str> {
        self.entries.get(channel_id).map(String::as_str)
    }

    /// Records the latest video id, returning the previous entry if any.
    pub fn record(&mut self, channel_id: &str, video_id: &str) -> Option<String> {
        self.entries
            .insert(channel_id.to_string(), video_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
