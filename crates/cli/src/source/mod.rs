//! Record sources for the pipeline's four inputs.
//!
//! - [`LiveSource`] scrapes the client table and calls the REST API.
//! - [`FixtureSource`] reads the same inputs from JSON files on disk.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use shop_ledger_core::{CoreError, JoinKey, RecordSet};
use thiserror::Error;

mod fixture;
pub mod html;
mod live;

pub use fixture::FixtureSource;
pub use live::LiveSource;

/// Supplies clients, carts, user profiles and products as record sets.
pub trait RecordSource {
    /// Every row of the paginated client table.
    fn clients(&self) -> impl Future<Output = Result<RecordSet, SourceError>> + Send;

    /// Every cart.
    fn carts(&self) -> impl Future<Output = Result<RecordSet, SourceError>> + Send;

    /// Profiles for the given user ids. Ids without a profile are skipped.
    fn user_profiles(
        &self,
        ids: &[JoinKey],
    ) -> impl Future<Output = Result<RecordSet, SourceError>> + Send;

    /// Catalog entries for the given product ids. Unknown ids are skipped.
    fn products(
        &self,
        ids: &[JoinKey],
    ) -> impl Future<Output = Result<RecordSet, SourceError>> + Send;
}

/// Errors raised while fetching input records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    /// The client table is missing from the page.
    #[error("No table with id '{id}' at {url}")]
    TableNotFound { url: String, id: &'static str },

    /// A pagination link could not be turned into a URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A fixture file could not be read.
    #[error("Cannot read fixture {}: {source}", path.display())]
    Fixture {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A fixture file is not valid JSON of the expected shape.
    #[error("Invalid fixture {}: {source}", path.display())]
    FixtureFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Fetched records did not fit the record model.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SourceError {
    /// Whether another attempt at the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Server-requested wait before retrying, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(secs) => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Distinct values in first-seen order.
pub(crate) fn distinct(ids: &[JoinKey]) -> Vec<JoinKey> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(SourceError::RateLimited(3).is_retryable());
        assert!(
            SourceError::Status {
                url: "http://x".into(),
                status: 503
            }
            .is_retryable()
        );
        assert!(
            !SourceError::Status {
                url: "http://x".into(),
                status: 404
            }
            .is_retryable()
        );
        assert!(
            !SourceError::TableNotFound {
                url: "http://x".into(),
                id: "userTable"
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(
            SourceError::RateLimited(4).retry_after(),
            Some(Duration::from_secs(4))
        );
        assert_eq!(SourceError::Url(url::ParseError::EmptyHost).retry_after(), None);
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let ids: Vec<JoinKey> = [3_i64, 1, 3, 2, 1].into_iter().map(JoinKey::from).collect();
        let distinct: Vec<String> = distinct(&ids).into_iter().map(JoinKey::into_inner).collect();
        assert_eq!(distinct, ["3", "1", "2"]);
    }
}
