#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use herald_client::error::{SourceError, SourceResult};
use herald_client::{NotificationPage, NotificationSource};
use herald_core::{Account, FeedKind, Identity, Notification, NotificationId, NotificationType};
use tokio::sync::Notify;

/// A fixed "now" for deterministic timestamps.
pub const NOW: u64 = 1_700_000_000;

struct Scripted {
    response: Result<NotificationPage, String>,
    gate: Option<Arc<Notify>>,
}

/// A notification source replaying queued responses in call order.
///
/// Every call is recorded. A gated response holds its caller until the
/// returned `Notify` is signalled.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(FeedKind, Option<NotificationId>)>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, page: NotificationPage) {
        self.push(Ok(page), None);
    }

    pub fn push_error(&self, msg: &str) {
        self.push(Err(msg.to_owned()), None);
    }

    pub fn push_gated_page(&self, page: NotificationPage) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(Ok(page), Some(gate.clone()));
        gate
    }

    fn push(&self, response: Result<NotificationPage, String>, gate: Option<Arc<Notify>>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted { response, gate });
    }

    pub fn calls(&self) -> Vec<(FeedKind, Option<NotificationId>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSource for ScriptedSource {
    async fn fetch_page(
        &self,
        kind: FeedKind,
        max_id: Option<NotificationId>,
    ) -> SourceResult<NotificationPage> {
        self.calls.lock().unwrap().push((kind, max_id));
        let scripted = self.script.lock().unwrap().pop_front();

        let Some(Scripted { response, gate }) = scripted else {
            return Err(SourceError::new("script exhausted"));
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response.map_err(SourceError::new)
    }
}

pub fn identity() -> Identity {
    Identity::new("109876", "mastodon.example").expect("valid identity")
}

/// Notification with a numeric id; higher ids are newer.
pub fn notification(id: u64) -> Notification {
    Notification {
        id: id.to_string().into(),
        kind: if id % 2 == 0 {
            NotificationType::Mention
        } else {
            NotificationType::Favourite
        },
        created_at: (NOW + id).into(),
        account: Account {
            id: format!("acct-{id}"),
            acct: format!("user{id}@example.org"),
            display_name: format!("User {id}"),
        },
        status: None,
    }
}

/// Notifications for `ids`, in the given order.
pub fn notifications(ids: &[u64]) -> Vec<Notification> {
    ids.iter().copied().map(notification).collect()
}

pub fn page(ids: &[u64]) -> NotificationPage {
    NotificationPage::new(notifications(ids))
}

pub fn last_page(ids: &[u64]) -> NotificationPage {
    NotificationPage::last(notifications(ids))
}

/// Poll `cond` until it holds, panicking after a few seconds.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Give background tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
