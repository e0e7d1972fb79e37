use std::io;
use std::path::PathBuf;

use herald_core::FeedKind;
use herald_util_error::BoxedError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CacheError {
    #[snafu(display("Cache I/O error at {}", path.display()))]
    Io { path: PathBuf, source: io::Error },
    #[snafu(display("Cache snapshot at {} is corrupted", path.display()))]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("Cache snapshot encoding error"))]
    Encode { source: serde_json::Error },
    #[snafu(display("Injected cache failure"))]
    Injected,
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Failure reported by a [`crate::NotificationSource`]
///
/// Sources are external collaborators (HTTP clients, fakes), so their
/// errors are carried opaquely.
#[derive(Debug, Snafu)]
#[snafu(display("Notification source error"))]
pub struct SourceError {
    source: BoxedError,
}

impl SourceError {
    pub fn new(source: impl Into<BoxedError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FeedError {
    #[snafu(display("Fetching {kind:?} page failed"))]
    Fetch { kind: FeedKind, source: SourceError },
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;
