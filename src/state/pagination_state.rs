//! Pagination state definitions for one anchor's traversal
//!
//! A traversal moves `Start -> Fetching -> Decoding -> Admitting` and then
//! either continues with the next page link or stops. Only the stop variants
//! are terminal.

use crate::ScrapeError;
use std::fmt;
use url::Url;

/// Kind of children being paginated under an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadKind {
    /// Comments under a post
    Comments,
    /// Replies under a comment
    Replies,
}

impl fmt::Display for ThreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comments => write!(f, "comments"),
            Self::Replies => write!(f, "replies"),
        }
    }
}

/// Phase of a page visit that can fail, used when logging the failure
///
/// Admission is pure and never fails, so it has no phase here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationPhase {
    Fetching,
    Decoding,
}

impl fmt::Display for PaginationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Decoding => "decoding",
        };
        write!(f, "{}", name)
    }
}

/// Why a traversal stopped
#[derive(Debug)]
pub enum StopReason {
    /// The budget ran out (possibly mid-batch; the rest of the batch is dropped)
    BudgetExhausted,

    /// No further page link exists, or a page held nothing to admit
    NaturalEnd,

    /// A continuation page failed to load or decode; earlier items are kept
    Interrupted(ScrapeError),
}

impl StopReason {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExhausted => write!(f, "budget exhausted"),
            Self::NaturalEnd => write!(f, "natural end"),
            Self::Interrupted(err) => write!(f, "interrupted: {}", err),
        }
    }
}

/// Outcome of admitting one decoded page
#[derive(Debug)]
pub enum PaginationStep {
    /// Fetch this page next
    Continue(Url),
    /// Traversal is over
    Stop(StopReason),
}
