//! Library error taxonomy.
//!
//! Every recoverable failure surfaces as a [`CryptoError`] from the public
//! call that hit it; nothing is retried internally. Callers may retry after
//! re-initialisation. Sensitive buffers are zeroised before an error is
//! returned.

use thiserror::Error;

/// Errors produced by the keystream engines, ciphers, KDFs and providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Seed or key length is not in the legal set for the primitive.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    /// Salt length is below the primitive's minimum.
    #[error("invalid salt: {0}")]
    InvalidSalt(&'static str),

    /// Output buffer is smaller than the requested length, or an
    /// offset/length pair overruns the buffer.
    #[error("invalid size: {0}")]
    InvalidSize(&'static str),

    /// The generator, cipher or KDF has not been initialized.
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),

    /// A per-primitive output ceiling or the reseed-request cap was hit.
    #[error("maximum exceeded: {0}")]
    MaxExceeded(&'static str),

    /// A parameter violates a design constraint (e.g. an odd parallel
    /// degree, a non power-of-two SCRYPT cost).
    #[error("illegal operation: {0}")]
    IllegalOperation(&'static str),

    /// The entropy provider failed or returned short.
    #[error("provider failure: {0}")]
    ProviderFailure(&'static str),

    /// Internal state was corrupted by a prior worker failure; the object
    /// must be reset and re-initialized before further use.
    #[error("poisoned state: {0}")]
    Poisoned(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = CryptoError::InvalidKey("key must be one of the legal sizes");
        assert!(err.to_string().contains("legal sizes"));

        let err = CryptoError::Poisoned("worker panic during parallel generation");
        assert!(err.to_string().starts_with("poisoned state"));
    }

    #[test]
    fn kinds_are_comparable() {
        assert_eq!(
            CryptoError::NotInitialized("x"),
            CryptoError::NotInitialized("x")
        );
        assert_ne!(
            CryptoError::NotInitialized("x"),
            CryptoError::MaxExceeded("x")
        );
    }
}
