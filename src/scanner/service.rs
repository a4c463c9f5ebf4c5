use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::notify::Notifier;
use crate::scanner::cache::LastSeenCache;
use crate::store::subscriptions::SubscriptionStore;
use crate::youtube::VideoQuery;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Time between full scan ticks.
    pub poll_interval: Duration,
    /// Flat delay after each channel query, as a rough API rate-limit guard.
    pub channel_delay: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            channel_delay: Duration::from_secs(1),
        }
    }
}

/// Periodic scan over every watched channel: query the latest upload, diff it
/// against the last-seen cache, and fan out notifications on a change.
///
/// The scanner owns its cache outright; a restart starts from an empty cache,
/// so the first observation of each channel only primes it.
pub struct Scanner {
    subscriptions: SubscriptionStore,
    videos: Arc<dyn VideoQuery>,
    notifier: Notifier,
    cache: LastSeenCache,
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(
        subscriptions: SubscriptionStore,
        videos: Arc<dyn VideoQuery>,
        notifier: Notifier,
        cache: LastSeenCache,
        config: ScannerConfig,
    ) -> Self {
        Self {
            subscriptions,
            videos,
            notifier,
            cache,
            config,
        }
    }

    /// Runs ticks until cancelled. Ticks never overlap: one tick finishes,
    /// including its per-channel delays, before the next is scheduled.
    pub async fn run_loop(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        // An overlong tick delays the next one by a full period instead of
        // firing catch-up ticks back to back.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(event = "scanner_stopped", "scan loop shutting down");
                    break;
                }
                _ = interval.tick() => self.tick().await,
            }
        }
    }

    pub async fn tick(&mut self) {
        let channels = match self.subscriptions.watched_channels() {
            Ok(channels) => channels,
            Err(err) => {
                tracing::error!(
                    event = "scan_list_failed",
                    error = %err,
                    "could not list watched channels"
                );
                return;
            }
        };
        if channels.is_empty() {
            return;
        }
        tracing::debug!(
            event = "scan_tick",
            channels = channels.len(),
            "scanning watched channels"
        );
        for channel_id in channels {
            self.scan_channel(&channel_id).await;
            tokio::time::sleep(self.config.channel_delay).await;
        }
    }

    async fn scan_channel(&mut self, channel_id: &str) {
        let video = match self.videos.latest_video(channel_id).await {
            Ok(Some(video)) => video,
            Ok(None) => return,
            Err(err) => {
                // One channel's failure never aborts the tick; the next
                // scheduled tick retries naturally.
                tracing::warn!(
                    event = "channel_query_failed",
                    channel_id = %channel_id,
                    error = %err,
                    "latest-video query failed"
                );
                return;
            }
        };
        if self.cache.last_seen(channel_id) == Some(video.id.as_str()) {
            return;
        }
        let primed = self.cache.record(channel_id, &video.id).is_some();
        if !primed {
            // First observation since startup: remember it, say nothing.
            tracing::info!(
                event = "channel_primed",
                channel_id = %channel_id,
                video_id = %video.id,
                "first observation, notification suppressed"
            );
            return;
        }
        let subscribers = match self.subscriptions.subscribers_of(channel_id) {
            Ok(subscribers) => subscribers,
            Err(err) => {
                tracing::error!(
                    event = "subscriber_lookup_failed",
                    channel_id = %channel_id,
                    error = %err,
                    "could not load subscribers"
                );
                return;
            }
        };
        tracing::info!(
            event = "new_video",
            channel_id = %channel_id,
            video_id = %video.id,
            title = %video.title,
            subscribers = subscribers.len(),
            "new video detected"
        );
        for destination_id in subscribers {
            self.notifier.notify(&destination_id, &video).await;
        }
    }

    pub fn cache(&self) -> &LastSeenCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{Scanner, ScannerConfig};
    use crate::notify::{NotificationChannel, Notifier, VideoMessage};
    use crate::scanner::cache::LastSeenCache;
    use crate::store::db::SqliteStore;
    use crate::store::subscriptions::SubscriptionStore;
    use crate::youtube::{VideoQuery, VideoQueryError, VideoQueryResult, VideoSummary};

    #[derive(Clone)]
    enum Scripted {
        Video(VideoSummary),
        Nothing,
        Fail,
    }

    #[derive(Default)]
    struct ScriptedVideos {
        outcomes: Mutex<HashMap<String, Scripted>>,
    }

    impl ScriptedVideos {
        fn set_video(&self, channel_id: &str, video_id: &str) {
            let video = VideoSummary {
                id: video_id.to_string(),
                title: format!("{video_id} title"),
                channel_title: format!("{channel_id} display"),
                thumbnail_url: format!("https://img.example/{video_id}.jpg"),
            };
            self.outcomes
                .lock()
                .unwrap()
                .insert(channel_id.to_string(), Scripted::Video(video));
        }

        fn set_failing(&self, channel_id: &str) {
            self.outcomes
                .lock()
                .unwrap()
                .insert(channel_id.to_string(), Scripted::Fail);
        }
    }

    #[async_trait]
    impl VideoQuery for ScriptedVideos {
        async fn latest_video(&self, channel_id: &str) -> VideoQueryResult<Option<VideoSummary>> {
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .get(channel_id)
                .cloned()
                .unwrap_or(Scripted::Nothing);
            match outcome {
                Scripted::Video(video) => Ok(Some(video)),
                Scripted::Nothing => Ok(None),
                Scripted::Fail => Err(VideoQueryError::Status { status: 500 }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(String, VideoMessage)>>,
        unreachable: Mutex<Vec<String>>,
    }

    impl RecordingChannel {
        fn deliveries(&self) -> Vec<(String, String)> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(dest, msg)| (dest.clone(), msg.url.clone()))
                .collect()
        }
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        fn channel_id(&self) -> &str {
            "recording"
        }

        async fn resolve(&self, destination_id: &str) -> Result<bool, anyhow::Error> {
            Ok(!self
                .unreachable
                .lock()
                .unwrap()
                .contains(&destination_id.to_string()))
        }

        async fn send(
            &self,
            destination_id: &str,
            message: &VideoMessage,
        ) -> Result<(), anyhow::Error> {
            self.sent
                .lock()
                .unwrap()
                .push((destination_id.to_string(), message.clone()));
            Ok(())
        }
    }

    struct Harness {
        scanner: Scanner,
        subscriptions: SubscriptionStore,
        videos: Arc<ScriptedVideos>,
        sink: Arc<RecordingChannel>,
        dir: std::path::PathBuf,
    }

    fn harness() -> Harness {
        let dir = std::env::temp_dir().join(format!("tubewatch-scan-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = SqliteStore::new(dir.join("subscriptions.db").to_string_lossy().to_string());
        store.touch().unwrap();
        let subscriptions = SubscriptionStore::new(store);
        let videos = Arc::new(ScriptedVideos::default());
        let sink = Arc::new(RecordingChannel::default());
        let scanner = Scanner::new(
            subscriptions.clone(),
            videos.clone(),
            Notifier::new(sink.clone()),
            LastSeenCache::new(),
            ScannerConfig {
                poll_interval: Duration::from_secs(300),
                channel_delay: Duration::ZERO,
            },
        );
        Harness {
            scanner,
            subscriptions,
            videos,
            sink,
            dir,
        }
    }

    #[tokio::test]
    async fn first_observation_primes_cache_without_delivery() {
        let mut h = harness();
        h.subscriptions.add("guild", "dest-1", "UCaaa").unwrap();
        h.videos.set_video("UCaaa", "v1");

        h.scanner.tick().await;

        assert_eq!(h.scanner.cache().last_seen("UCaaa"), Some("v1"));
        assert!(h.sink.deliveries().is_empty());
        std::fs::remove_dir_all(&h.dir).ok();
    }

    #[tokio::test]
    async fn new_video_notifies_every_subscriber_once() {
        let mut h = harness();
        h.subscriptions.add("guild", "dest-1", "UCaaa").unwrap();
        h.subscriptions.add("guild", "dest-2", "UCaaa").unwrap();
        h.videos.set_video("UCaaa", "v1");
        h.scanner.tick().await;

        h.videos.set_video("UCaaa", "v2");
        h.scanner.tick().await;

        assert_eq!(h.scanner.cache().last_seen("UCaaa"), Some("v2"));
        let mut deliveries = h.sink.deliveries();
        deliveries.sort();
        assert_eq!(
            deliveries,
            vec![
                (
                    "dest-1".to_string(),
                    "https://www.youtube.com/watch?v=v2".to_string()
                ),
                (
                    "dest-2".to_string(),
                    "https://www.youtube.com/watch?v=v2".to_string()
                ),
            ]
        );
        std::fs::remove_dir_all(&h.dir).ok();
    }

    #[tokio::test]
    async fn unchanged_video_is_a_no_op() {
        let mut h = harness();
        h.subscriptions.add("guild", "dest-1", "UCaaa").unwrap();
        h.videos.set_video("UCaaa", "v1");
        h.scanner.tick().await;
        h.scanner.tick().await;

        assert_eq!(h.scanner.cache().last_seen("UCaaa"), Some("v1"));
        assert!(h.sink.deliveries().is_empty());
        std::fs::remove_dir_all(&h.dir).ok();
    }

    #[tokio::test]
    async fn failing_channel_does_not_abort_the_tick() {
        let mut h = harness();
        h.subscriptions.add("guild", "dest-a", "UCaaa").unwrap();
        h.subscriptions.add("guild", "dest-b", "UCbbb").unwrap();
        h.subscriptions.add("guild", "dest-c", "UCccc").unwrap();
        h.videos.set_video("UCaaa", "a1");
        h.videos.set_failing("UCbbb");
        h.videos.set_video("UCccc", "c1");
        h.scanner.tick().await;

        h.videos.set_video("UCaaa", "a2");
        h.videos.set_video("UCccc", "c2");
        h.scanner.tick().await;

        let mut deliveries = h.sink.deliveries();
        deliveries.sort();
        assert_eq!(
            deliveries,
            vec![
                (
                    "dest-a".to_string(),
                    "https://www.youtube.com/watch?v=a2".to_string()
                ),
                (
                    "dest-c".to_string(),
                    "https://www.youtube.com/watch?v=c2".to_string()
                ),
            ]
        );
        assert_eq!(h.scanner.cache().last_seen("UCbbb"), None);
        std::fs::remove_dir_all(&h.dir).ok();
    }

    struct SlowFeed {
        tick_starts: Mutex<Vec<tokio::time::Instant>>,
        first_query_time: Duration,
        first_done: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl VideoQuery for SlowFeed {
        async fn latest_video(&self, _channel_id: &str) -> VideoQueryResult<Option<VideoSummary>> {
            self.tick_starts
                .lock()
                .unwrap()
                .push(tokio::time::Instant::now());
            if !self
                .first_done
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                tokio::time::sleep(self.first_query_time).await;
            }
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_tick_keeps_fixed_spacing_instead_of_bursting() {
        let dir = std::env::temp_dir().join(format!("tubewatch-scan-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = SqliteStore::new(dir.join("subscriptions.db").to_string_lossy().to_string());
        store.touch().unwrap();
        let subscriptions = SubscriptionStore::new(store);
        subscriptions.add("guild", "dest-1", "UCaaa").unwrap();

        // The first tick overruns several poll intervals; the following
        // ticks must stay a full interval apart rather than firing
        // back-to-back to catch up.
        let poll_interval = Duration::from_millis(100);
        let feed = Arc::new(SlowFeed {
            tick_starts: Mutex::new(Vec::new()),
            first_query_time: Duration::from_millis(350),
            first_done: std::sync::atomic::AtomicBool::new(false),
        });
        let scanner = Scanner::new(
            subscriptions,
            feed.clone(),
            Notifier::new(Arc::new(RecordingChannel::default())),
            LastSeenCache::new(),
            ScannerConfig {
                poll_interval,
                channel_delay: Duration::ZERO,
            },
        );
        let shutdown = tokio_util::sync::CancellationToken::new();
        let handle = tokio::spawn(scanner.run_loop(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(700)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let starts = feed.tick_starts.lock().unwrap();
        assert!(starts.len() >= 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= poll_interval);
        }
        drop(starts);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn unresolvable_destination_is_skipped_silently() {
        let mut h = harness();
        h.subscriptions.add("guild", "dest-gone", "UCaaa").unwrap();
        h.subscriptions.add("guild", "dest-live", "UCaaa").unwrap();
        h.sink
            .unreachable
            .lock()
            .unwrap()
            .push("dest-gone".to_string());
        h.videos.set_video("UCaaa", "v1");
        h.scanner.tick().await;
        h.videos.set_video("UCaaa", "v2");
        h.scanner.tick().await;

        assert_eq!(
            h.sink.deliveries(),
            vec![(
                "dest-live".to_string(),
                "https://www.youtube.com/watch?v=v2".to_string()
            )]
        );
        std::fs::remove_dir_all(&h.dir).ok();
    }
}
