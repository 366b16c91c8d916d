use reviewlens_core::config::TelemetryConfig;
use reviewlens_core::Identity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::collector::SnapshotSink;
use crate::context::{ClickEvent, SessionContext};

/// Behavioral signals fed to the tracker by whatever UI surface hosts it.
#[derive(Debug)]
pub enum UiEvent {
    Click(ClickEvent),
    Scroll,
    /// The summary element entered the viewport.
    SummaryShown,
    /// The summary element left the viewport.
    SummaryHidden,
    PageChanged { url: String, title: String },
    VisibilityChanged { hidden: bool },
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Quiet period that closes an activity burst.
    pub debounce: Duration,
    /// Keep-alive cadence, independent of the debounce.
    pub heartbeat: Duration,
}

impl TrackerConfig {
    pub fn from_config(cfg: &TelemetryConfig) -> Self {
        Self {
            debounce: Duration::from_secs(cfg.debounce_secs),
            heartbeat: Duration::from_secs(cfg.heartbeat_secs),
        }
    }
}

enum TrackerState {
    Anonymous,
    Authenticated(SessionContext),
}

enum Applied {
    None,
    /// The event counts as activity and re-arms the debounce window.
    Activity,
    /// The event triggers an immediate snapshot with the given action.
    Emit(&'static str),
}

/// Parked far in the future while no activity burst is open.
const IDLE_REARM: Duration = Duration::from_secs(24 * 60 * 60);

/// Session telemetry tracker: accumulates behavioral signal into the
/// session context and flushes snapshots to the collector.
///
/// Tracking only happens while authenticated. Activity bursts are
/// coalesced by a trailing-edge debounce; a separate heartbeat emits a
/// keep-alive when nothing has been flushed for a full interval. The two
/// timers are independent and may race; duplicate or out-of-order
/// snapshots are tolerated by the collector.
pub struct SessionTracker {
    sink: Arc<dyn SnapshotSink>,
    config: TrackerConfig,
    state: TrackerState,
}

impl SessionTracker {
    pub fn new(sink: Arc<dyn SnapshotSink>, config: TrackerConfig) -> Self {
        Self {
            sink,
            config,
            state: TrackerState::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, TrackerState::Authenticated(_))
    }

    pub fn context(&self) -> Option<&SessionContext> {
        match &self.state {
            TrackerState::Authenticated(ctx) => Some(ctx),
            TrackerState::Anonymous => None,
        }
    }

    /// Enter the authenticated state and emit the immediate login snapshot.
    pub async fn login(&mut self, identity: Identity) {
        info!(email = %identity.email, "Session tracking started");
        self.state = TrackerState::Authenticated(SessionContext::new(identity));
        if let TrackerState::Authenticated(ctx) = &self.state {
            let snapshot = ctx.snapshot("login", serde_json::Map::new());
            if let Err(e) = self.sink.deliver(snapshot).await {
                warn!(error = %e, "Failed to deliver login snapshot");
            }
        }
    }

    /// Finalize dwell, send the logout snapshot synchronously, then drop
    /// the session state. Ordering matters: the snapshot must carry the
    /// final dwell total.
    pub async fn logout(&mut self) {
        if let TrackerState::Authenticated(ctx) = &mut self.state {
            ctx.dwell.finalize(std::time::Instant::now());
            let snapshot = ctx.snapshot("logout", serde_json::Map::new());
            if let Err(e) = self.sink.deliver(snapshot).await {
                warn!(error = %e, "Failed to deliver logout snapshot");
            }
        }
        self.state = TrackerState::Anonymous;
        info!("Session tracking stopped");
    }

    fn apply(&mut self, event: UiEvent) -> Applied {
        let ctx = match &mut self.state {
            TrackerState::Authenticated(ctx) => ctx,
            TrackerState::Anonymous => return Applied::None,
        };

        match event {
            UiEvent::Click(click) => {
                ctx.record_click(click);
                Applied::Activity
            }
            UiEvent::Scroll => Applied::Activity,
            UiEvent::SummaryShown => {
                ctx.dwell.shown(std::time::Instant::now());
                Applied::None
            }
            UiEvent::SummaryHidden => {
                ctx.dwell.hidden(std::time::Instant::now());
                Applied::None
            }
            UiEvent::PageChanged { url, title } => {
                ctx.visit(&url, &title);
                Applied::None
            }
            UiEvent::VisibilityChanged { hidden } => {
                if hidden {
                    ctx.dwell.finalize(std::time::Instant::now());
                    Applied::None
                } else {
                    Applied::Emit("page_visible")
                }
            }
        }
    }

    /// Fire-and-forget snapshot delivery; failures are logged, never
    /// retried or queued.
    fn emit_detached(&self, action: &'static str) {
        let ctx = match &self.state {
            TrackerState::Authenticated(ctx) => ctx,
            TrackerState::Anonymous => return,
        };
        let snapshot = ctx.snapshot(action, serde_json::Map::new());
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(snapshot).await {
                warn!(error = %e, action, "Failed to deliver telemetry snapshot");
            }
        });
    }

    async fn teardown(&mut self) {
        if let TrackerState::Authenticated(ctx) = &mut self.state {
            ctx.dwell.finalize(std::time::Instant::now());
            let snapshot = ctx.snapshot("page_unload", serde_json::Map::new());
            if let Err(e) = self.sink.deliver(snapshot).await {
                warn!(error = %e, "Failed to deliver final snapshot");
            }
        }
    }

    /// Drive the tracker until the event source closes or shutdown fires.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<UiEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(
            debounce_secs = self.config.debounce.as_secs(),
            heartbeat_secs = self.config.heartbeat.as_secs(),
            "Session tracker running"
        );

        let mut heartbeat = time::interval(self.config.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let debounce = time::sleep(IDLE_REARM);
        tokio::pin!(debounce);
        let mut activity_dirty = false;
        let mut last_flush = Instant::now();

        loop {
            tokio::select! {
                maybe = events.recv() => match maybe {
                    Some(event) => match self.apply(event) {
                        Applied::Activity => {
                            activity_dirty = true;
                            debounce.as_mut().reset(Instant::now() + self.config.debounce);
                        }
                        Applied::Emit(action) => self.emit_detached(action),
                        Applied::None => {}
                    },
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                _ = &mut debounce, if activity_dirty => {
                    self.emit_detached("activity_sync");
                    activity_dirty = false;
                    last_flush = Instant::now();
                    debounce.as_mut().reset(Instant::now() + IDLE_REARM);
                }
                _ = heartbeat.tick() => {
                    if self.is_authenticated() && last_flush.elapsed() >= self.config.heartbeat {
                        self.emit_detached("periodic_sync");
                        last_flush = Instant::now();
                    }
                }
                _ = shutdown.recv() => {
                    self.teardown().await;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Snapshot;
    use async_trait::async_trait;
    use reviewlens_core::Result;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        snapshots: Mutex<Vec<Snapshot>>,
    }

    impl RecordingSink {
        fn actions(&self) -> Vec<String> {
            self.snapshots
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.action.clone())
                .collect()
        }

        fn count(&self, action: &str) -> usize {
            self.actions().iter().filter(|a| *a == action).count()
        }

        fn last(&self) -> Option<Snapshot> {
            self.snapshots.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl SnapshotSink for RecordingSink {
        async fn deliver(&self, snapshot: Snapshot) -> Result<()> {
            self.snapshots.lock().unwrap().push(snapshot);
            Ok(())
        }
    }

    fn identity() -> Identity {
        Identity::new("t@example.com", "user_abc123def", 2, "2024-05-01T00:00:00Z")
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            debounce: Duration::from_secs(2),
            heartbeat: Duration::from_secs(30),
        }
    }

    fn click() -> ClickEvent {
        ClickEvent::at("https://t.test/a", "A", 10, 20)
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_events_are_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let tracker = SessionTracker::new(sink.clone(), config());
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(tracker.run(rx, shutdown_rx));

        for _ in 0..3 {
            tx.send(UiEvent::Click(click())).await.unwrap();
        }
        time::sleep(Duration::from_secs(5)).await;

        drop(tx);
        handle.await.unwrap();
        assert!(sink.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_burst_flushes_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(tracker.run(rx, shutdown_rx));

        for _ in 0..5 {
            tx.send(UiEvent::Click(click())).await.unwrap();
        }
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(sink.count("activity_sync"), 1);

        drop(tx);
        handle.await.unwrap();
        assert_eq!(sink.count("page_unload"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_activity_pushes_the_debounce_deadline() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(tracker.run(rx, shutdown_rx));

        // Three clicks one second apart: each lands inside the previous
        // 2s window, so only the final quiet period flushes.
        for _ in 0..3 {
            tx.send(UiEvent::Click(click())).await.unwrap();
            time::sleep(Duration::from_secs(1)).await;
        }
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(sink.count("activity_sync"), 1);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_fires_with_zero_activity() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(tracker.run(rx, shutdown_rx));

        time::sleep(Duration::from_secs(61)).await;

        assert_eq!(sink.count("periodic_sync"), 2);
        assert_eq!(sink.count("activity_sync"), 0);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_waits_a_full_interval_after_a_flush() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(tracker.run(rx, shutdown_rx));

        tx.send(UiEvent::Click(click())).await.unwrap();
        // Activity flush lands at ~2s; the 30s heartbeat tick sees only
        // 28s since that flush and stays quiet.
        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(sink.count("activity_sync"), 1);
        assert_eq!(sink.count("periodic_sync"), 0);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sink.count("periodic_sync"), 1);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_page_and_visibility_events() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;

        assert!(matches!(
            tracker.apply(UiEvent::PageChanged {
                url: "https://t.test/b".to_string(),
                title: "B".to_string(),
            }),
            Applied::None
        ));
        assert_eq!(tracker.context().unwrap().current_url, "https://t.test/b");

        assert!(matches!(
            tracker.apply(UiEvent::VisibilityChanged { hidden: false }),
            Applied::Emit("page_visible")
        ));
        assert!(matches!(
            tracker.apply(UiEvent::VisibilityChanged { hidden: true }),
            Applied::None
        ));
        assert!(matches!(
            tracker.apply(UiEvent::Click(click())),
            Applied::Activity
        ));
        assert!(matches!(tracker.apply(UiEvent::Scroll), Applied::Activity));
    }

    #[tokio::test]
    async fn test_logout_sends_final_snapshot_before_clearing_state() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = SessionTracker::new(sink.clone(), config());
        tracker.login(identity()).await;
        tracker.apply(UiEvent::Click(click()));

        tracker.logout().await;

        let last = sink.last().unwrap();
        assert_eq!(last.action, "logout");
        assert!(last.session_end.is_some());
        assert_eq!(last.total_clicks, 1);
        assert!(!tracker.is_authenticated());
    }
}
