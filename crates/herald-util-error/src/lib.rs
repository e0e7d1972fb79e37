//! Error aliases and compact error formatting shared across herald crates.
use std::{error, fmt};

pub type BoxedError = Box<dyn error::Error + Send + Sync + 'static>;
pub type BoxedErrorResult<T> = std::result::Result<T, BoxedError>;

pub type WhateverResult<T> = std::result::Result<T, snafu::Whatever>;

/// Iterator over an error and all its `source()`s, outermost first
pub struct ErrorChain<'e> {
    next: Option<&'e (dyn error::Error + 'static)>,
}

impl<'e> Iterator for ErrorChain<'e> {
    type Item = &'e (dyn error::Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = cur.source();
        Some(cur)
    }
}

pub fn error_chain<'e>(err: &'e (dyn error::Error + 'static)) -> ErrorChain<'e> {
    ErrorChain { next: Some(err) }
}

/// Displays the whole error chain on one line: `outer: middle: root`
///
/// Meant for log fields, where the default `Display` of a wrapper error
/// tends to hide the only useful part.
pub struct CompactError<'e>(&'e (dyn error::Error + 'static));

impl fmt::Display for CompactError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in error_chain(self.0).enumerate() {
            if 0 < i {
                f.write_str(": ")?;
            }
            fmt::Display::fmt(err, f)?;
        }
        Ok(())
    }
}

pub trait FmtCompact {
    fn fmt_compact(&self) -> CompactError<'_>;
}

impl<E> FmtCompact for E
where
    E: error::Error + 'static,
{
    fn fmt_compact(&self) -> CompactError<'_> {
        CompactError(self)
    }
}
