use thiserror::Error;

/// Errors from [`crate::RoutingEngine`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No coordinates were provided.
    #[error("at least one coordinate is required")]
    EmptyInput,

    /// Network error communicating with the routing service.
    #[error("network error requesting {url}: {message}")]
    NetworkError {
        /// The URL that was requested.
        url: String,
        /// Description of the network error.
        message: String,
    },

    /// Request to the routing service timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The URL that was requested.
        url: String,
        /// Timeout duration in seconds.
        timeout_secs: u64,
    },

    /// HTTP error response from the routing service.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error message or response body excerpt.
        message: String,
    },

    /// The routing service reported a failure in its response body.
    #[error("routing service error ({code}): {message}")]
    ServiceError {
        /// Service-specific error code.
        code: String,
        /// Error message from the service.
        message: String,
    },

    /// Failed to decode the service response.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Description of the parse failure.
        message: String,
    },

    /// The engine does not implement the requested operation.
    #[error("routing operation {operation} is not supported")]
    Unsupported {
        /// Name of the operation.
        operation: &'static str,
    },
}
