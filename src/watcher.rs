//! Channel watch loop
//!
//! The core of the bot: a per-channel polling state machine that detects a
//! new long-form upload via the cheap upload-count tripwire, resolves which
//! video is new (filtering out Shorts), waits for its transcript, and hands
//! the result downstream. One tokio task per watch session; cancellation is
//! cooperative and observed around every suspension point.
//!
//! States: Seeding -> Waiting <-> Detected -> Resolving -> Transcribing,
//! terminating in Done (a `WatchOutcome`) or Stopped (cancellation).

use crate::transcript::TranscriptClient;
use crate::types::{
    DurationClass, PlatformError, RecentUpload, TranscriptOutcome, TripwireSignal,
    VideoCandidate, WatchEvent, WatchOutcome,
};
use crate::youtube::classify::classify_seconds;
use crate::youtube::YouTubeClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Consecutive tripwire failures before the operator hears about it
const FETCH_TROUBLE_THRESHOLD: u32 = 3;

/// Video platform metadata collaborator, as the watch loop sees it.
#[async_trait]
pub trait ChannelFeed: Send + Sync {
    /// Total upload count for the channel (cheap)
    async fn upload_count(&self, channel_id: &str) -> Result<u64, PlatformError>;
    /// The `max` most recent uploads, newest first (more expensive)
    async fn recent_uploads(
        &self,
        channel_id: &str,
        max: usize,
    ) -> Result<Vec<RecentUpload>, PlatformError>;
    /// Re-fetch one video's duration (Unknown-retry path)
    async fn video_duration_secs(&self, video_id: &str) -> Result<Option<u64>, PlatformError>;
    /// Probe the short-form URL path; Unknown on any failure
    async fn probe_short(&self, video_id: &str) -> DurationClass;
}

/// Captioning collaborator, as the watch loop sees it.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> TranscriptOutcome;
}

#[async_trait]
impl ChannelFeed for YouTubeClient {
    async fn upload_count(&self, channel_id: &str) -> Result<u64, PlatformError> {
        YouTubeClient::upload_count(self, channel_id).await
    }

    async fn recent_uploads(
        &self,
        channel_id: &str,
        max: usize,
    ) -> Result<Vec<RecentUpload>, PlatformError> {
        YouTubeClient::recent_uploads(self, channel_id, max).await
    }

    async fn video_duration_secs(&self, video_id: &str) -> Result<Option<u64>, PlatformError> {
        YouTubeClient::video_duration_secs(self, video_id).await
    }

    async fn probe_short(&self, video_id: &str) -> DurationClass {
        YouTubeClient::probe_short(self, video_id).await
    }
}

#[async_trait]
impl TranscriptSource for TranscriptClient {
    async fn fetch(&self, video_id: &str) -> TranscriptOutcome {
        TranscriptClient::fetch(self, video_id).await
    }
}

/// Tunables for one watch session.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Sleep between tripwire checks
    pub poll_interval: Duration,
    /// Wait before re-checking an Unknown duration
    pub classify_retry_delay: Duration,
    /// How many recent uploads the resolver fetches
    pub recent_fetch: usize,
    /// Extended pause when the whole credential pool is exhausted
    pub quota_pause: Duration,
    /// Re-poll cadence for a NotYetAvailable transcript; None = finish after
    /// the first not-ready answer
    pub transcript_retry: Option<Duration>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            classify_retry_delay: Duration::from_secs(15),
            recent_fetch: 8,
            quota_pause: Duration::from_secs(900),
            transcript_retry: Some(Duration::from_secs(60)),
        }
    }
}

/// Mutable per-session state. The upload count only ever moves forward; any
/// decrease reported upstream is clamped to Unchanged by the tripwire.
#[derive(Debug)]
pub struct ChannelWatchState {
    pub channel_id: String,
    pub upload_count: Option<u64>,
    pub baseline_video_id: Option<String>,
}

impl ChannelWatchState {
    fn new(channel_id: String) -> Self {
        Self {
            channel_id,
            upload_count: None,
            baseline_video_id: None,
        }
    }
}

/// One upload-count tripwire check against the recorded baseline.
pub async fn check_uploads<F: ChannelFeed + ?Sized>(
    feed: &F,
    channel_id: &str,
    last_count: u64,
) -> TripwireSignal {
    match feed.upload_count(channel_id).await {
        Ok(current) if current > last_count => TripwireSignal::Increased(current - last_count),
        // A decrease (deletion upstream) is clamped to Unchanged
        Ok(_) => TripwireSignal::Unchanged,
        Err(e) => TripwireSignal::FetchFailed(e),
    }
}

/// Find the most recent long-form upload, or None if everything recent is a
/// Short.
///
/// Unknown durations get one retry after `classify_retry_delay`, then the
/// Shorts probe; a still-indeterminate video is treated as Long (wrongly
/// processing a short is recoverable, dropping a long video is not).
pub async fn resolve_latest_long<F: ChannelFeed + ?Sized>(
    feed: &F,
    channel_id: &str,
    opts: &WatchOptions,
) -> Result<Option<VideoCandidate>, PlatformError> {
    let uploads = feed.recent_uploads(channel_id, opts.recent_fetch).await?;

    for upload in uploads {
        let mut class = classify_seconds(upload.duration_secs);

        if class == DurationClass::Unknown {
            debug!(
                "Duration for {} not populated yet, retrying in {:?}",
                upload.id, opts.classify_retry_delay
            );
            sleep(opts.classify_retry_delay).await;

            match feed.video_duration_secs(&upload.id).await {
                Ok(secs) => class = classify_seconds(secs),
                Err(e) => warn!("Duration re-fetch for {} failed: {}", upload.id, e),
            }

            if class == DurationClass::Unknown {
                class = match feed.probe_short(&upload.id).await {
                    DurationClass::Short => DurationClass::Short,
                    // Probe failure keeps the safety bias toward Long
                    _ => DurationClass::Long,
                };
            }
        }

        if class == DurationClass::Long {
            return Ok(Some(VideoCandidate {
                id: upload.id,
                title: upload.title,
                duration: DurationClass::Long,
            }));
        }
    }

    Ok(None)
}

enum Phase {
    Seeding,
    Waiting,
    Detected { new_count: u64 },
    Resolving { video: VideoCandidate },
    Transcribing { video: VideoCandidate },
}

/// One watch session: Seeding through Done/Stopped for a single channel.
pub struct WatchSession<F, T> {
    feed: Arc<F>,
    transcripts: Arc<T>,
    opts: WatchOptions,
    events: mpsc::Sender<WatchEvent>,
    cancel: watch::Receiver<bool>,
    state: ChannelWatchState,
}

impl<F, T> WatchSession<F, T>
where
    F: ChannelFeed + 'static,
    T: TranscriptSource + 'static,
{
    pub fn new(
        feed: Arc<F>,
        transcripts: Arc<T>,
        channel_id: String,
        opts: WatchOptions,
        events: mpsc::Sender<WatchEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            feed,
            transcripts,
            opts,
            events,
            cancel,
            state: ChannelWatchState::new(channel_id),
        }
    }

    /// Drive the session to Done or Stopped.
    pub async fn run(mut self) -> WatchOutcome {
        let channel_id = self.state.channel_id.clone();
        let feed = Arc::clone(&self.feed);
        let transcripts = Arc::clone(&self.transcripts);
        let opts = self.opts.clone();

        info!("Watch session starting for channel {}", channel_id);

        let mut phase = Phase::Seeding;
        let mut consecutive_failures: u32 = 0;
        let mut quota_alerted = false;
        let mut transcript_notified = false;

        loop {
            if self.is_cancelled() {
                return self.stopped().await;
            }

            phase = match phase {
                Phase::Seeding => {
                    let Some(count) = self.guard(feed.upload_count(&channel_id)).await else {
                        return self.stopped().await;
                    };

                    match count {
                        Ok(count) => {
                            let Some(baseline) = self
                                .guard(resolve_latest_long(&*feed, &channel_id, &opts))
                                .await
                            else {
                                return self.stopped().await;
                            };

                            let baseline_video_id = match baseline {
                                Ok(Some(video)) => Some(video.id),
                                Ok(None) => None,
                                Err(e) => {
                                    warn!("Baseline video resolution failed: {}", e);
                                    None
                                }
                            };

                            self.state.upload_count = Some(count);
                            self.state.baseline_video_id = baseline_video_id.clone();
                            quota_alerted = false;
                            consecutive_failures = 0;

                            info!(
                                "Seeded channel {}: {} uploads, baseline video {:?}",
                                channel_id, count, baseline_video_id
                            );
                            self.notify(WatchEvent::Seeded {
                                channel_id: channel_id.clone(),
                                upload_count: count,
                                baseline_video_id,
                            })
                            .await;
                            Phase::Waiting
                        }
                        Err(PlatformError::QuotaExhausted) => {
                            if !quota_alerted {
                                self.notify(WatchEvent::QuotaExhausted).await;
                                quota_alerted = true;
                            }
                            if self.sleep_cancellable(opts.quota_pause).await {
                                return self.stopped().await;
                            }
                            Phase::Seeding
                        }
                        Err(e) => {
                            warn!("Seeding fetch failed: {}", e);
                            if self.sleep_cancellable(opts.poll_interval).await {
                                return self.stopped().await;
                            }
                            Phase::Seeding
                        }
                    }
                }

                Phase::Waiting => {
                    if self.sleep_cancellable(opts.poll_interval).await {
                        return self.stopped().await;
                    }

                    // upload_count is always Some after Seeding
                    let baseline = self.state.upload_count.unwrap_or(0);
                    let Some(signal) = self
                        .guard(check_uploads(&*feed, &channel_id, baseline))
                        .await
                    else {
                        return self.stopped().await;
                    };

                    match signal {
                        TripwireSignal::Unchanged => {
                            consecutive_failures = 0;
                            quota_alerted = false;
                            debug!("Channel {} unchanged at {} uploads", channel_id, baseline);
                            Phase::Waiting
                        }
                        TripwireSignal::Increased(delta) => {
                            consecutive_failures = 0;
                            quota_alerted = false;
                            let new_count = baseline + delta;
                            info!(
                                "Channel {} upload count {} -> {}",
                                channel_id, baseline, new_count
                            );
                            self.notify(WatchEvent::UploadDetected { new_count, delta })
                                .await;
                            Phase::Detected { new_count }
                        }
                        TripwireSignal::FetchFailed(PlatformError::QuotaExhausted) => {
                            if !quota_alerted {
                                self.notify(WatchEvent::QuotaExhausted).await;
                                quota_alerted = true;
                            }
                            // Extended pause instead of burning the pool on
                            // every poll tick
                            if self.sleep_cancellable(opts.quota_pause).await {
                                return self.stopped().await;
                            }
                            Phase::Waiting
                        }
                        TripwireSignal::FetchFailed(e) => {
                            consecutive_failures += 1;
                            warn!(
                                "Tripwire fetch failed ({} consecutive): {}",
                                consecutive_failures, e
                            );
                            if consecutive_failures == FETCH_TROUBLE_THRESHOLD {
                                self.notify(WatchEvent::FetchTrouble {
                                    consecutive: consecutive_failures,
                                    message: e.to_string(),
                                })
                                .await;
                            }
                            Phase::Waiting
                        }
                    }
                }

                Phase::Detected { new_count } => {
                    let Some(resolved) = self
                        .guard(resolve_latest_long(&*feed, &channel_id, &opts))
                        .await
                    else {
                        return self.stopped().await;
                    };

                    match resolved {
                        Err(e) => {
                            // Leave the count baseline alone so the same
                            // increase trips again next poll
                            warn!("Latest-video resolution failed: {}", e);
                            Phase::Waiting
                        }
                        Ok(candidate) => {
                            let is_new = candidate
                                .as_ref()
                                .map(|v| Some(&v.id) != self.state.baseline_video_id.as_ref())
                                .unwrap_or(false);

                            // Either way the count increase has been consumed
                            self.state.upload_count = Some(new_count);

                            match candidate {
                                Some(video) if is_new => {
                                    self.state.baseline_video_id = Some(video.id.clone());
                                    Phase::Resolving { video }
                                }
                                _ => {
                                    // No long video, or the same one as our
                                    // baseline: the bump was a Short
                                    info!(
                                        "Upload count increase on {} was not a new long video",
                                        channel_id
                                    );
                                    self.notify(WatchEvent::ShortConsumed { new_count }).await;
                                    Phase::Waiting
                                }
                            }
                        }
                    }
                }

                Phase::Resolving { video } => {
                    info!(
                        "New long-form video on {}: {} ({})",
                        channel_id, video.title, video.id
                    );
                    self.notify(WatchEvent::NewLongVideo {
                        video: video.clone(),
                    })
                    .await;
                    Phase::Transcribing { video }
                }

                Phase::Transcribing { video } => {
                    let Some(outcome) = self.guard(transcripts.fetch(&video.id)).await else {
                        return self.stopped().await;
                    };

                    match outcome {
                        TranscriptOutcome::Ready(text) => {
                            info!("Transcript ready for {} ({} chars)", video.id, text.len());
                            self.notify(WatchEvent::TranscriptReady {
                                video_id: video.id.clone(),
                            })
                            .await;
                            return WatchOutcome::Completed {
                                video,
                                transcript: TranscriptOutcome::Ready(text),
                            };
                        }
                        TranscriptOutcome::Failed(reason) => {
                            warn!("Transcript fetch for {} failed: {}", video.id, reason);
                            self.notify(WatchEvent::TranscriptFailed {
                                video_id: video.id.clone(),
                                reason: reason.clone(),
                            })
                            .await;
                            return WatchOutcome::Completed {
                                video,
                                transcript: TranscriptOutcome::Failed(reason),
                            };
                        }
                        TranscriptOutcome::NotYetAvailable => {
                            if !transcript_notified {
                                self.notify(WatchEvent::TranscriptPending {
                                    video_id: video.id.clone(),
                                })
                                .await;
                                transcript_notified = true;
                            }

                            match opts.transcript_retry {
                                Some(delay) => {
                                    if self.sleep_cancellable(delay).await {
                                        return self.stopped().await;
                                    }
                                    Phase::Transcribing { video }
                                }
                                None => {
                                    return WatchOutcome::Completed {
                                        video,
                                        transcript: TranscriptOutcome::NotYetAvailable,
                                    };
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    async fn stopped(&self) -> WatchOutcome {
        info!("Watch session for {} stopped", self.state.channel_id);
        self.notify(WatchEvent::Stopped).await;
        WatchOutcome::Cancelled
    }

    async fn notify(&self, event: WatchEvent) {
        // A dropped receiver only costs us notifications, not the session
        let _ = self.events.send(event).await;
    }

    /// Run a future to completion unless cancellation arrives first.
    /// Returns None on cancellation; in-flight work is dropped.
    async fn guard<O>(&mut self, fut: impl std::future::Future<Output = O>) -> Option<O> {
        tokio::select! {
            out = fut => Some(out),
            _ = wait_cancelled(&mut self.cancel) => None,
        }
    }

    /// Sleep, returning true if cancellation arrived during the nap.
    async fn sleep_cancellable(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => self.is_cancelled(),
            _ = wait_cancelled(&mut self.cancel) => true,
        }
    }
}

/// Resolves once the cancel flag flips true, or the sender side is dropped
/// (an orphaned session has no operator left to report to).
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted feed: each call pops the next scripted response, repeating
    /// the last one once the script runs out.
    struct MockFeed {
        counts: Mutex<(usize, Vec<Result<u64, PlatformError>>)>,
        uploads: Mutex<(usize, Vec<Vec<RecentUpload>>)>,
        durations: Mutex<HashMap<String, Option<u64>>>,
        probe: DurationClass,
    }

    impl MockFeed {
        fn new(
            counts: Vec<Result<u64, PlatformError>>,
            uploads: Vec<Vec<RecentUpload>>,
        ) -> Self {
            Self {
                counts: Mutex::new((0, counts)),
                uploads: Mutex::new((0, uploads)),
                durations: Mutex::new(HashMap::new()),
                probe: DurationClass::Unknown,
            }
        }

        fn with_duration(self, id: &str, secs: Option<u64>) -> Self {
            self.durations.lock().unwrap().insert(id.to_string(), secs);
            self
        }

        fn with_probe(mut self, probe: DurationClass) -> Self {
            self.probe = probe;
            self
        }
    }

    fn next_scripted<V: Clone>(state: &Mutex<(usize, Vec<V>)>) -> V {
        let mut guard = state.lock().unwrap();
        let (index, script) = &mut *guard;
        let item = script[(*index).min(script.len() - 1)].clone();
        *index += 1;
        item
    }

    #[async_trait]
    impl ChannelFeed for MockFeed {
        async fn upload_count(&self, _channel_id: &str) -> Result<u64, PlatformError> {
            next_scripted(&self.counts)
        }

        async fn recent_uploads(
            &self,
            _channel_id: &str,
            _max: usize,
        ) -> Result<Vec<RecentUpload>, PlatformError> {
            Ok(next_scripted(&self.uploads))
        }

        async fn video_duration_secs(
            &self,
            video_id: &str,
        ) -> Result<Option<u64>, PlatformError> {
            Ok(self
                .durations
                .lock()
                .unwrap()
                .get(video_id)
                .copied()
                .flatten())
        }

        async fn probe_short(&self, _video_id: &str) -> DurationClass {
            self.probe
        }
    }

    struct MockTranscripts {
        outcomes: Mutex<(usize, Vec<TranscriptOutcome>)>,
    }

    impl MockTranscripts {
        fn new(outcomes: Vec<TranscriptOutcome>) -> Self {
            Self {
                outcomes: Mutex::new((0, outcomes)),
            }
        }
    }

    #[async_trait]
    impl TranscriptSource for MockTranscripts {
        async fn fetch(&self, _video_id: &str) -> TranscriptOutcome {
            next_scripted(&self.outcomes)
        }
    }

    fn long(id: &str) -> RecentUpload {
        RecentUpload {
            id: id.to_string(),
            title: format!("video {}", id),
            duration_secs: Some(600),
        }
    }

    fn short(id: &str) -> RecentUpload {
        RecentUpload {
            id: id.to_string(),
            title: format!("short {}", id),
            duration_secs: Some(45),
        }
    }

    fn fast_opts() -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(5),
            classify_retry_delay: Duration::from_millis(1),
            recent_fetch: 8,
            quota_pause: Duration::from_millis(5),
            transcript_retry: None,
        }
    }

    struct Harness {
        handle: tokio::task::JoinHandle<WatchOutcome>,
        events: mpsc::Receiver<WatchEvent>,
        cancel: watch::Sender<bool>,
    }

    fn start(feed: MockFeed, transcripts: MockTranscripts, opts: WatchOptions) -> Harness {
        let (event_tx, events) = mpsc::channel(64);
        let (cancel, cancel_rx) = watch::channel(false);
        let session = WatchSession::new(
            Arc::new(feed),
            Arc::new(transcripts),
            "UC_test".to_string(),
            opts,
            event_tx,
            cancel_rx,
        );
        Harness {
            handle: tokio::spawn(session.run()),
            events,
            cancel,
        }
    }

    async fn finish(mut harness: Harness) -> (WatchOutcome, Vec<WatchEvent>) {
        let outcome = harness.handle.await.unwrap();
        let mut events = Vec::new();
        while let Ok(ev) = harness.events.try_recv() {
            events.push(ev);
        }
        (outcome, events)
    }

    fn count_events(events: &[WatchEvent], pred: impl Fn(&WatchEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[tokio::test]
    async fn test_tripwire_unchanged_is_idempotent() {
        let feed = MockFeed::new(vec![Ok(120)], vec![vec![]]);
        assert!(matches!(
            check_uploads(&feed, "c", 120).await,
            TripwireSignal::Unchanged
        ));
        assert!(matches!(
            check_uploads(&feed, "c", 120).await,
            TripwireSignal::Unchanged
        ));
    }

    #[tokio::test]
    async fn test_tripwire_decrease_clamps_to_unchanged() {
        let feed = MockFeed::new(vec![Ok(119)], vec![vec![]]);
        assert!(matches!(
            check_uploads(&feed, "c", 120).await,
            TripwireSignal::Unchanged
        ));
    }

    #[tokio::test]
    async fn test_tripwire_failure_is_not_unchanged() {
        let feed = MockFeed::new(
            vec![Err(PlatformError::Network("down".into()))],
            vec![vec![]],
        );
        assert!(matches!(
            check_uploads(&feed, "c", 120).await,
            TripwireSignal::FetchFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_resolver_skips_shorts() {
        let feed = MockFeed::new(vec![], vec![vec![short("s1"), short("s2"), long("v1")]]);
        let found = resolve_latest_long(&feed, "c", &fast_opts())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "v1");
        assert_eq!(found.duration, DurationClass::Long);
    }

    #[tokio::test]
    async fn test_resolver_none_when_all_short() {
        let feed = MockFeed::new(vec![], vec![vec![short("s1"), short("s2")]]);
        assert!(resolve_latest_long(&feed, "c", &fast_opts())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolver_unknown_retry_recovers_duration() {
        let mut candidate = long("v1");
        candidate.duration_secs = None;
        let feed =
            MockFeed::new(vec![], vec![vec![candidate]]).with_duration("v1", Some(600));

        let found = resolve_latest_long(&feed, "c", &fast_opts())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "v1");
    }

    #[tokio::test]
    async fn test_resolver_unknown_falls_back_to_long() {
        // Duration never populates and the probe is indeterminate: the
        // safety bias says Long
        let mut candidate = long("v1");
        candidate.duration_secs = None;
        let feed = MockFeed::new(vec![], vec![vec![candidate]])
            .with_duration("v1", None)
            .with_probe(DurationClass::Unknown);

        let found = resolve_latest_long(&feed, "c", &fast_opts())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "v1");
    }

    #[tokio::test]
    async fn test_resolver_probe_can_rule_out_short() {
        let mut candidate = short("s1");
        candidate.duration_secs = None;
        let feed = MockFeed::new(vec![], vec![vec![candidate]])
            .with_duration("s1", None)
            .with_probe(DurationClass::Short);

        assert!(resolve_latest_long(&feed, "c", &fast_opts())
            .await
            .unwrap()
            .is_none());
    }

    /// Scenario A: count stays at 120, the loop stays silent in Waiting.
    #[tokio::test]
    async fn test_scenario_unchanged_stays_waiting() {
        let feed = MockFeed::new(vec![Ok(120)], vec![vec![long("v0")]]);
        let harness = start(feed, MockTranscripts::new(vec![]), fast_opts());

        tokio::time::sleep(Duration::from_millis(50)).await;
        harness.cancel.send(true).unwrap();
        let (outcome, events) = finish(harness).await;

        assert!(matches!(outcome, WatchOutcome::Cancelled));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::Seeded { .. })),
            1
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::UploadDetected { .. })),
            0
        );
    }

    /// Scenario B: 120 -> 121 with a new long video V1; the full transition
    /// sequence runs and the baseline moves to V1.
    #[tokio::test]
    async fn test_scenario_new_long_video_detected() {
        let feed = MockFeed::new(
            vec![Ok(120), Ok(121)],
            vec![vec![long("v0")], vec![long("v1"), long("v0")]],
        );
        let transcripts =
            MockTranscripts::new(vec![TranscriptOutcome::Ready("a million dollars".into())]);
        let harness = start(feed, transcripts, fast_opts());
        let (outcome, events) = finish(harness).await;

        match outcome {
            WatchOutcome::Completed { video, transcript } => {
                assert_eq!(video.id, "v1");
                assert_eq!(
                    transcript,
                    TranscriptOutcome::Ready("a million dollars".into())
                );
            }
            other => panic!("expected Completed, got {:?}", other),
        }

        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::UploadDetected { .. })),
            1
        );
        assert_eq!(
            count_events(
                &events,
                |e| matches!(e, WatchEvent::NewLongVideo { video } if video.id == "v1")
            ),
            1
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::TranscriptReady { .. })),
            1
        );
    }

    /// Scenario C: as B but captions are not published yet; with retry
    /// disabled the session finishes with a not-ready notice and no crash.
    #[tokio::test]
    async fn test_scenario_transcript_not_ready() {
        let feed = MockFeed::new(
            vec![Ok(120), Ok(121)],
            vec![vec![long("v0")], vec![long("v1"), long("v0")]],
        );
        let transcripts = MockTranscripts::new(vec![TranscriptOutcome::NotYetAvailable]);
        let harness = start(feed, transcripts, fast_opts());
        let (outcome, events) = finish(harness).await;

        assert!(matches!(
            outcome,
            WatchOutcome::Completed {
                transcript: TranscriptOutcome::NotYetAvailable,
                ..
            }
        ));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::TranscriptPending { .. })),
            1
        );
    }

    /// With transcript retry enabled the waiter re-polls until Ready, and
    /// the pending notice is emitted exactly once.
    #[tokio::test]
    async fn test_transcript_retry_until_ready() {
        let feed = MockFeed::new(
            vec![Ok(120), Ok(121)],
            vec![vec![long("v0")], vec![long("v1"), long("v0")]],
        );
        let transcripts = MockTranscripts::new(vec![
            TranscriptOutcome::NotYetAvailable,
            TranscriptOutcome::NotYetAvailable,
            TranscriptOutcome::Ready("massive".into()),
        ]);
        let mut opts = fast_opts();
        opts.transcript_retry = Some(Duration::from_millis(2));
        let harness = start(feed, transcripts, opts);
        let (outcome, events) = finish(harness).await;

        assert!(matches!(
            outcome,
            WatchOutcome::Completed {
                transcript: TranscriptOutcome::Ready(_),
                ..
            }
        ));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::TranscriptPending { .. })),
            1
        );
    }

    /// Scenario D: three consecutive tripwire failures leave the loop in
    /// Waiting with its baseline intact, and emit one trouble notice.
    #[tokio::test]
    async fn test_scenario_fetch_failures_stay_waiting() {
        let err = || Err(PlatformError::Network("down".into()));
        let feed = MockFeed::new(
            vec![Ok(120), err(), err(), err(), Ok(120)],
            vec![vec![long("v0")]],
        );
        let harness = start(feed, MockTranscripts::new(vec![]), fast_opts());

        tokio::time::sleep(Duration::from_millis(60)).await;
        harness.cancel.send(true).unwrap();
        let (outcome, events) = finish(harness).await;

        assert!(matches!(outcome, WatchOutcome::Cancelled));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::UploadDetected { .. })),
            0
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::FetchTrouble { .. })),
            1
        );
    }

    /// Scenario E: a fully exhausted credential pool produces a single
    /// operator alert and an extended pause, not one alert per attempt.
    #[tokio::test]
    async fn test_scenario_quota_exhaustion_single_alert() {
        let quota = || Err(PlatformError::QuotaExhausted);
        let feed = MockFeed::new(
            vec![Ok(120), quota(), quota(), quota()],
            vec![vec![long("v0")]],
        );
        let harness = start(feed, MockTranscripts::new(vec![]), fast_opts());

        tokio::time::sleep(Duration::from_millis(60)).await;
        harness.cancel.send(true).unwrap();
        let (outcome, events) = finish(harness).await;

        assert!(matches!(outcome, WatchOutcome::Cancelled));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::QuotaExhausted)),
            1
        );
    }

    /// Duplicate-signal suppression: the count rose but the newest long
    /// video is still the baseline, so nothing is transcribed and the count
    /// baseline advances.
    #[tokio::test]
    async fn test_duplicate_signal_suppressed() {
        let feed = MockFeed::new(
            // Third poll sees 121 again: must be Unchanged against the
            // advanced baseline, not a second detection
            vec![Ok(120), Ok(121), Ok(121)],
            vec![vec![long("v0")], vec![long("v0")]],
        );
        let harness = start(feed, MockTranscripts::new(vec![]), fast_opts());

        tokio::time::sleep(Duration::from_millis(60)).await;
        harness.cancel.send(true).unwrap();
        let (outcome, events) = finish(harness).await;

        assert!(matches!(outcome, WatchOutcome::Cancelled));
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::UploadDetected { .. })),
            1
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::ShortConsumed { .. })),
            1
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, WatchEvent::NewLongVideo { .. })),
            0
        );
    }

    /// Cancellation during the poll sleep stops the session promptly.
    #[tokio::test]
    async fn test_cancellation_during_sleep() {
        let feed = MockFeed::new(vec![Ok(120)], vec![vec![long("v0")]]);
        let mut opts = fast_opts();
        opts.poll_interval = Duration::from_secs(3600);
        let harness = start(feed, MockTranscripts::new(vec![]), opts);

        tokio::time::sleep(Duration::from_millis(20)).await;
        harness.cancel.send(true).unwrap();

        let (outcome, events) =
            tokio::time::timeout(Duration::from_secs(1), finish(harness))
                .await
                .expect("session must stop promptly");
        assert!(matches!(outcome, WatchOutcome::Cancelled));
        assert_eq!(count_events(&events, |e| matches!(e, WatchEvent::Stopped)), 1);
    }
}
