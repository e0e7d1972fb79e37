//! View model behind a notification timeline screen
//!
//! Binds a [`FeedDataController`] to the cache and to the UI: seeds the
//! feed from the cached snapshot, keeps the snapshot up to date, and exposes
//! `load_latest`/`load_more` along with the flags a list UI needs.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use herald_core::{Identity, Notification, NotificationId, Scope, Timestamp};
use herald_util_error::FmtCompact as _;
use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument, trace, warn};

use crate::cache::NotificationCache;
use crate::feed::{FeedDataController, FeedState, LoadNextOutcome};
use crate::load_older::{LoadOlderEvent, LoadOlderState, LoadOlderStateMachine};
use crate::source::NotificationSource;

const LOG_TARGET: &str = "herald::timeline";

/// `load_more` only fires for items this close to the end of the list
pub const DEFAULT_LOAD_MORE_THRESHOLD: usize = 5;
/// Minimum time between two automatic refreshes
pub const DEFAULT_AUTO_FETCH_INTERVAL: Duration = Duration::from_secs(60);

pub struct NotificationTimelineViewModel {
    identity: Identity,
    scope: Scope,
    data_controller: Arc<FeedDataController>,
    load_older: LoadOlderStateMachine,

    loading_latest_count: AtomicUsize,
    is_loading_latest: watch::Sender<bool>,
    did_load_latest: broadcast::Sender<()>,
    last_automatic_fetch: watch::Sender<Option<Timestamp>>,

    load_more_threshold: usize,
    auto_fetch_interval: Duration,
}

#[bon::bon]
impl NotificationTimelineViewModel {
    /// Create a view model, with the feed already seeded from `cache`
    ///
    /// Must be called within a tokio runtime. The cache writer runs as a
    /// task until the view model is dropped, and persists the last state
    /// published before that.
    #[builder(finish_fn(name = "build"))]
    pub async fn new(
        identity: Identity,
        scope: Scope,
        cache: Arc<dyn NotificationCache>,
        source: Arc<dyn NotificationSource>,
        #[builder(default = DEFAULT_LOAD_MORE_THRESHOLD)] load_more_threshold: usize,
        #[builder(default = DEFAULT_AUTO_FETCH_INTERVAL)] auto_fetch_interval: Duration,
    ) -> Self {
        let data_controller = Arc::new(FeedDataController::new(source));

        let cached = cache.read(scope, &identity).await;
        debug!(
            target: LOG_TARGET,
            %scope,
            %identity,
            count = cached.len(),
            "Seeding timeline from cache"
        );
        data_controller.seed(FeedState::from_notifications(cached, scope.feed_kind()));

        // Subscribe before anything can publish, so no update is missed and
        // the seeded state is not written back
        let mut state_rx = data_controller.subscribe();
        let persisted = state_rx.borrow_and_update().notifications().cloned().collect();
        tokio::spawn(
            CacheWriter {
                cache,
                identity: identity.clone(),
                scope,
                state_rx,
                persisted,
            }
            .run(),
        );

        let (is_loading_latest, _) = watch::channel(false);
        let (did_load_latest, _) = broadcast::channel(16);
        let (last_automatic_fetch, _) = watch::channel(None);

        Self {
            identity,
            scope,
            data_controller,
            load_older: LoadOlderStateMachine::new(),
            loading_latest_count: AtomicUsize::new(0),
            is_loading_latest,
            did_load_latest,
            last_automatic_fetch,
            load_more_threshold: load_more_threshold.max(1),
            auto_fetch_interval,
        }
    }
}

impl NotificationTimelineViewModel {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn records(&self) -> Arc<FeedState> {
        self.data_controller.state()
    }

    pub fn subscribe_records(&self) -> watch::Receiver<Arc<FeedState>> {
        self.data_controller.subscribe()
    }

    pub fn is_loading_latest(&self) -> bool {
        *self.is_loading_latest.borrow()
    }

    pub fn subscribe_loading_latest(&self) -> watch::Receiver<bool> {
        self.is_loading_latest.subscribe()
    }

    /// Fires once after every [`Self::load_latest`], successful or not
    pub fn subscribe_did_load_latest(&self) -> broadcast::Receiver<()> {
        self.did_load_latest.subscribe()
    }

    pub fn load_older_state(&self) -> LoadOlderState {
        self.load_older.state()
    }

    pub fn subscribe_load_older_state(&self) -> watch::Receiver<LoadOlderState> {
        self.load_older.subscribe()
    }

    pub fn last_automatic_fetch(&self) -> Option<Timestamp> {
        *self.last_automatic_fetch.borrow()
    }

    /// Replace the timeline with the newest page
    ///
    /// Errors are logged; the timeline keeps whatever it showed before. If
    /// the refresh dropped older records, reaching the end of the list
    /// again has to be possible, so `NoMore` is lifted.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn load_latest(&self) {
        {
            let _loading = LoadingLatestGuard::raise(self);

            match self
                .data_controller
                .load_initial(self.scope.feed_kind())
                .await
            {
                Ok(0) => {}
                Ok(dropped) => {
                    debug!(target: LOG_TARGET, dropped, "Refresh dropped older records");
                    self.load_older.handle(LoadOlderEvent::Truncated);
                }
                Err(err) => {
                    warn!(
                        target: LOG_TARGET,
                        err = %err.fmt_compact(),
                        "Failed to load latest notifications"
                    );
                }
            }
        }

        if self.did_load_latest.send(()).is_err() {
            trace!(target: LOG_TARGET, "No did-load-latest observers");
        }
    }

    /// Refresh on screen appearance, at most once per auto fetch interval
    ///
    /// Returns `true` if a refresh was made.
    pub async fn load_latest_if_stale(&self, now: Timestamp) -> bool {
        let interval = self.auto_fetch_interval;
        let stale = self.last_automatic_fetch.send_if_modified(|last| {
            let stale = last.is_none_or(|last| interval <= now.duration_since(last));
            if stale {
                *last = Some(now);
            }
            stale
        });

        if !stale {
            trace!(target: LOG_TARGET, %now, "Automatic fetch not due yet");
            return false;
        }

        self.load_latest().await;
        true
    }

    /// Load the page older than the current end of the timeline
    ///
    /// `item` is the record the UI is about to display; it has to be within
    /// the load-more threshold of the end of the list. The state machine
    /// drops the request while a fetch is in flight and after the server
    /// reported there is nothing older. Returns the resulting state.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn load_more(&self, item: &NotificationId) -> LoadOlderState {
        if !self.is_near_end(item) {
            trace!(target: LOG_TARGET, "Item not near the end of the timeline");
            return self.load_older.state();
        }

        match self.load_older.handle(LoadOlderEvent::Trigger) {
            Some(LoadOlderState::Loading) => self.on_enter_loading().await,
            _ => self.load_older.state(),
        }
    }

    async fn on_enter_loading(&self) -> LoadOlderState {
        let mut pending = PendingLoadOlder::new(&self.load_older);

        let event = match self
            .data_controller
            .load_next(self.scope.feed_kind())
            .await
        {
            Ok(LoadNextOutcome::EndOfData) => LoadOlderEvent::Succeeded { end_of_data: true },
            Ok(LoadNextOutcome::More | LoadNextOutcome::Stale) => {
                LoadOlderEvent::Succeeded { end_of_data: false }
            }
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    err = %err.fmt_compact(),
                    "Failed to load older notifications"
                );
                LoadOlderEvent::Failed
            }
        };

        pending.finish(event);
        self.load_older.state()
    }

    fn is_near_end(&self, item: &NotificationId) -> bool {
        let state = self.data_controller.state();
        if state.is_empty() {
            return true;
        }
        state
            .position(item)
            .is_some_and(|pos| state.len() - pos <= self.load_more_threshold)
    }
}

/// Keeps `is_loading_latest` raised while at least one load is running,
/// including loads whose future got dropped midway
struct LoadingLatestGuard<'a> {
    vm: &'a NotificationTimelineViewModel,
}

impl<'a> LoadingLatestGuard<'a> {
    fn raise(vm: &'a NotificationTimelineViewModel) -> Self {
        vm.loading_latest_count.fetch_add(1, Ordering::SeqCst);
        vm.is_loading_latest.send_replace(true);
        Self { vm }
    }
}

impl Drop for LoadingLatestGuard<'_> {
    fn drop(&mut self) {
        if self.vm.loading_latest_count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.vm.is_loading_latest.send_replace(false);
        }
    }
}

/// Reports a dropped in-flight fetch as failed, so the machine can't stay
/// stuck in `Loading`
struct PendingLoadOlder<'a> {
    machine: &'a LoadOlderStateMachine,
    finished: bool,
}

impl<'a> PendingLoadOlder<'a> {
    fn new(machine: &'a LoadOlderStateMachine) -> Self {
        Self {
            machine,
            finished: false,
        }
    }

    fn finish(&mut self, event: LoadOlderEvent) {
        self.finished = true;
        self.machine.handle(event);
    }
}

impl Drop for PendingLoadOlder<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.machine.handle(LoadOlderEvent::Failed);
        }
    }
}

/// Persists every distinct feed state, in publish order
///
/// Ends once the feed controller is gone. A state published right before
/// that is still delivered by `changed()`, so it gets written too.
struct CacheWriter {
    cache: Arc<dyn NotificationCache>,
    identity: Identity,
    scope: Scope,
    state_rx: watch::Receiver<Arc<FeedState>>,
    /// Last snapshot handed to the cache
    persisted: Vec<Notification>,
}

impl CacheWriter {
    #[instrument(
        name = "notification-cache-writer",
        skip(self),
        fields(scope = %self.scope, identity = %self.identity)
    )]
    async fn run(mut self) {
        while self.state_rx.changed().await.is_ok() {
            let notifications: Vec<Notification> = self
                .state_rx
                .borrow_and_update()
                .notifications()
                .cloned()
                .collect();

            if notifications == self.persisted {
                trace!(target: LOG_TARGET, "Feed republished without changes");
                continue;
            }

            match self
                .cache
                .write(self.scope, &self.identity, &notifications)
                .await
            {
                Ok(()) => {
                    debug!(
                        target: LOG_TARGET,
                        count = notifications.len(),
                        "Notification cache updated"
                    );
                }
                Err(err) => {
                    warn!(
                        target: LOG_TARGET,
                        err = %err.fmt_compact(),
                        "Failed to update notification cache"
                    );
                }
            }
            self.persisted = notifications;
        }
        debug!(target: LOG_TARGET, "Feed closed, cache writer done");
    }
}
