//! Request-signing seam
//!
//! The platform requires a signature token (`X-Bogus`) computed over the
//! outgoing query string by a platform-specific algorithm. That algorithm is
//! not part of this library: embedders supply an implementation of
//! [`QuerySigner`] (typically bridging to a JS engine or a native port).
//! When no signer is configured, or a signer fails, requests are issued
//! unsigned rather than aborted — some endpoints still answer.

use thiserror::Error;

/// Error raised by a [`QuerySigner`] implementation
#[derive(Debug, Error)]
pub enum SigningError {
    /// The signer could not produce a token for this query
    #[error("signing unavailable: {0}")]
    Unavailable(String),
}

/// Computes the platform's request-authenticity token over a query string.
///
/// The token is appended to the request as the `X-Bogus` query parameter.
/// Implementations must be cheap enough to call once per API request.
pub trait QuerySigner: Send + Sync {
    /// Sign the given query string (already percent-encoded, without the
    /// leading `?`), returning the token value.
    fn sign(&self, query: &str) -> Result<String, SigningError>;
}

impl<F> QuerySigner for F
where
    F: Fn(&str) -> Result<String, SigningError> + Send + Sync,
{
    fn sign(&self, query: &str) -> Result<String, SigningError> {
        self(query)
    }
}
