//! Unified error type.

use thiserror::Error;

/// Boxed error carried by request bodies and notifier backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by svckit's fallible operations.
///
/// Application-level failures (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. The observability
/// path never surfaces these to the client either: it logs them and falls
/// back to a safe default.
#[derive(Debug, Error)]
pub enum Error {
    /// The request body stream failed before it reached its end.
    #[error("body: {0}")]
    Body(#[source] BoxError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Why no upstream trace context could be read from a header carrier.
///
/// Not a failure of the request: the middleware answers it by starting a
/// root span.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("carrier holds no trace context")]
    NotFound,
    #[error("carrier holds a malformed trace context: {0}")]
    Malformed(String),
}

/// A notification backend could not deliver an alert.
#[derive(Debug, Error)]
#[error("notification `{title}` not delivered: {source}")]
pub struct NotifyError {
    pub title: String,
    #[source]
    pub source: BoxError,
}
