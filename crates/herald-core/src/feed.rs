use serde::{Deserialize, Serialize};

use crate::{Notification, NotificationId, Relationship};

/// Endpoint kind a feed is fetched from
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    NotificationAll,
    NotificationMentions,
}

/// One entry of a feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub kind: FeedKind,
    pub notification: Notification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
}

impl FeedRecord {
    pub fn from_notification(notification: Notification, kind: FeedKind) -> Self {
        Self {
            kind,
            notification,
            relationship: None,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.notification.id
    }
}
