//! Ordered, deduplicated feed of notification records and the controller
//! that fetches pages into it.
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald_core::{FeedKind, FeedRecord, Notification, NotificationId};
use snafu::ResultExt as _;
use tokio::sync::{Mutex, watch};
use tracing::{debug, instrument};

use crate::error::{FeedResult, FetchSnafu};
use crate::source::NotificationSource;

const LOG_TARGET: &str = "herald::feed";

/// Feed records, newest first, at most one record per notification id
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedState {
    records: Vec<FeedRecord>,
}

impl FeedState {
    /// Build a state from `records`, keeping the first occurrence of every id
    pub fn new(records: impl IntoIterator<Item = FeedRecord>) -> Self {
        let mut state = Self::default();
        state.append(records);
        state
    }

    pub fn from_notifications(
        notifications: impl IntoIterator<Item = Notification>,
        kind: FeedKind,
    ) -> Self {
        Self::new(
            notifications
                .into_iter()
                .map(|n| FeedRecord::from_notification(n, kind)),
        )
    }

    pub fn records(&self) -> &[FeedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The oldest record, which is the cursor for the next older page
    pub fn oldest(&self) -> Option<&FeedRecord> {
        self.records.last()
    }

    pub fn position(&self, id: &NotificationId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.position(id).is_some()
    }

    /// Notifications to persist in the cache
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.records.iter().map(|r| &r.notification)
    }

    /// Append records at the old end, skipping ids already present
    ///
    /// Returns the number of records actually added.
    fn append(&mut self, records: impl IntoIterator<Item = FeedRecord>) -> usize {
        let mut seen: HashSet<NotificationId> =
            self.records.iter().map(|r| r.id().clone()).collect();
        let before = self.records.len();
        for record in records {
            if seen.insert(record.id().clone()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }
}

/// What a [`FeedDataController::load_next`] call achieved
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadNextOutcome {
    /// Page appended, more may be available
    More,
    /// Server has nothing older
    EndOfData,
    /// State was replaced by a newer load while fetching, page discarded
    Stale,
}

/// Owns the [`FeedState`] and is the only thing that mutates it
///
/// Every change is published through a `watch` channel, and only if the
/// state actually changed.
pub struct FeedDataController {
    source: Arc<dyn NotificationSource>,
    state_tx: watch::Sender<Arc<FeedState>>,
    /// Bumped on every replacement of the state, under the `state_tx` lock
    generation: AtomicU64,
    load_initial_lock: Mutex<()>,
}

impl FeedDataController {
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(FeedState::default()));
        Self {
            source,
            state_tx,
            generation: AtomicU64::new(0),
            load_initial_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> Arc<FeedState> {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedState>> {
        self.state_tx.subscribe()
    }

    /// Replace the state without touching the network
    pub fn seed(&self, state: FeedState) {
        debug!(target: LOG_TARGET, count = state.len(), "Seeding feed state");
        self.replace(state);
    }

    /// Fetch the newest page of `kind` and make it the whole state
    ///
    /// Concurrent calls are serialized; the last one to finish wins.
    /// Returns how many previously loaded records the new state dropped.
    #[instrument(skip(self), err(Display))]
    pub async fn load_initial(&self, kind: FeedKind) -> FeedResult<usize> {
        let _lock = self.load_initial_lock.lock().await;

        let page = self
            .source
            .fetch_page(kind, None)
            .await
            .context(FetchSnafu { kind })?;

        let state = FeedState::from_notifications(page.notifications, kind);
        let count = state.len();
        let dropped = self.replace(state);

        debug!(target: LOG_TARGET, ?kind, count, dropped, "Loaded newest page");
        Ok(dropped)
    }

    /// Fetch the page older than the current oldest record and append it
    #[instrument(skip(self), err(Display))]
    pub async fn load_next(&self, kind: FeedKind) -> FeedResult<LoadNextOutcome> {
        let (cursor, generation) = {
            let state = self.state_tx.borrow();
            (
                state.oldest().map(|r| r.id().clone()),
                self.generation.load(Ordering::SeqCst),
            )
        };

        let page = self
            .source
            .fetch_page(kind, cursor.clone())
            .await
            .context(FetchSnafu { kind })?;
        let end_of_data = page.is_end();

        let mut stale = false;
        let mut added = 0;
        self.state_tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                stale = true;
                return false;
            }
            let mut next = (**state).clone();
            added = next.append(
                page.notifications
                    .into_iter()
                    .map(|n| FeedRecord::from_notification(n, kind)),
            );
            if added == 0 {
                return false;
            }
            *state = Arc::new(next);
            true
        });

        let outcome = if stale {
            LoadNextOutcome::Stale
        } else if end_of_data {
            LoadNextOutcome::EndOfData
        } else {
            LoadNextOutcome::More
        };

        debug!(
            target: LOG_TARGET,
            ?kind,
            cursor = cursor.as_ref().map(NotificationId::as_str),
            added,
            ?outcome,
            "Loaded older page"
        );
        Ok(outcome)
    }

    /// Returns the number of old records missing from `new_state`
    fn replace(&self, new_state: FeedState) -> usize {
        let mut dropped = 0;
        self.state_tx.send_if_modified(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            if **state == new_state {
                return false;
            }
            dropped = state
                .records
                .iter()
                .filter(|r| !new_state.contains(r.id()))
                .count();
            *state = Arc::new(new_state);
            true
        });
        dropped
    }
}
