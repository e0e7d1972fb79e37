//! Data model of the notification timeline
//!
//! Everything here is plain data: records as produced by the server, the
//! scope/kind selectors and the identity a timeline belongs to. Behavior
//! lives in `herald-client`.
pub mod feed;
pub mod id;
pub mod identity;
pub mod notification;
pub mod scope;
mod timestamp;

pub use self::feed::{FeedKind, FeedRecord};
pub use self::id::NotificationId;
pub use self::identity::Identity;
pub use self::notification::{Account, Notification, NotificationType, Relationship, StatusRef};
pub use self::scope::Scope;
pub use self::timestamp::Timestamp;
