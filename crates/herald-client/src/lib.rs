pub mod cache;
pub mod error;
pub mod feed;
pub mod load_older;
pub mod source;
pub mod timeline;

pub use self::cache::{FileNotificationCache, InMemoryNotificationCache, NotificationCache};
pub use self::feed::{FeedDataController, FeedState, LoadNextOutcome};
pub use self::load_older::{LoadOlderEvent, LoadOlderState, LoadOlderStateMachine};
pub use self::source::{NotificationPage, NotificationSource};
pub use self::timeline::NotificationTimelineViewModel;
