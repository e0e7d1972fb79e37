use std::{fmt, str};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::FeedKind;

/// Which subset of notifications a timeline shows
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Everything,
    Mentions,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Everything, Scope::Mentions];

    /// Feed endpoint kind used to fetch this scope
    pub fn feed_kind(self) -> FeedKind {
        match self {
            Scope::Everything => FeedKind::NotificationAll,
            Scope::Mentions => FeedKind::NotificationMentions,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Everything => "everything",
            Scope::Mentions => "mentions",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown notification scope: {value}"))]
pub struct ScopeParseError {
    value: String,
}

impl str::FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScopeParseError {
                value: s.to_owned(),
            })
    }
}
