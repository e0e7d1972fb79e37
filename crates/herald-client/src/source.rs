use herald_core::{FeedKind, Notification, NotificationId};

use crate::error::SourceResult;

/// One page of notifications, newest first
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    /// Server indicated there is nothing older than this page
    pub end_of_data: bool,
}

impl NotificationPage {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            notifications,
            end_of_data: false,
        }
    }

    pub fn last(notifications: Vec<Notification>) -> Self {
        Self {
            notifications,
            end_of_data: true,
        }
    }

    /// An empty page also means there is nothing older
    pub fn is_end(&self) -> bool {
        self.end_of_data || self.notifications.is_empty()
    }
}

/// Network side of the notification feed
#[async_trait::async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch a page of `kind`
    ///
    /// With `max_id` set, only notifications strictly older than `max_id` are
    /// returned. Without it, the newest page.
    async fn fetch_page(
        &self,
        kind: FeedKind,
        max_id: Option<NotificationId>,
    ) -> SourceResult<NotificationPage>;
}
