//! Non-fatal notifications surfaced to the caller (toast material).

use feed::FetchFailure;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A discovery call failed; the page counted as empty
    FetchFailed { page: u32, message: String },
    /// A discovery call hit the configured timeout; the page counted as empty
    FetchTimedOut { page: u32, after: Duration },
    /// Advisory hint returned with the first page
    Hint(String),
}

impl Notice {
    pub(crate) fn from_failure(page: u32, failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Error(message) => Notice::FetchFailed { page, message },
            FetchFailure::TimedOut(after) => Notice::FetchTimedOut { page, after },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FetchFailed { page, message } => {
                write!(f, "Could not load page {}: {}", page, message)
            }
            Notice::FetchTimedOut { page, after } => {
                write!(f, "Page {} did not load within {:?}", page, after)
            }
            Notice::Hint(hint) => write!(f, "{}", hint),
        }
    }
}
