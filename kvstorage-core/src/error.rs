//! Error types for key-value storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the storage facade, its codecs and its backends.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
pub enum StorageError {
    /// The value could not be represented by the codec.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The stored bytes are malformed or do not match the requested shape.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Errors coming from the device keystore.
    #[error("keystore error: {0}")]
    Keystore(String),

    /// Errors reported by a backend implementation.
    #[error("backend error: {0}")]
    Backend(String),

    /// An I/O operation on a file-backed store failed.
    #[error("I/O error during {context}: {message}")]
    Io {
        /// Context describing the operation.
        context: String,
        /// The underlying I/O error, rendered.
        message: String,
    },

    /// A storage mutex was poisoned by a panicking writer.
    #[error("storage lock error: {0}")]
    Lock(String),

    /// Failure deliberately switched on through [`crate::MemoryBackend::set_fail_writes`].
    #[error("injected failure: {0}")]
    InjectedFailure(String),

    /// Unexpected `UniFFI` callback error.
    #[cfg(feature = "ffi")]
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

#[cfg(feature = "ffi")]
impl From<uniffi::UnexpectedUniFFICallbackError> for StorageError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

impl StorageError {
    /// Creates an I/O error with context.
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: source.to_string(),
        }
    }

    /// Creates a backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a keystore error.
    pub fn keystore<S: Into<String>>(message: S) -> Self {
        Self::Keystore(message.into())
    }

    /// Creates a poisoned-lock error naming the guarded resource.
    pub fn poisoned<S: AsRef<str>>(resource: S) -> Self {
        Self::Lock(format!("{} mutex poisoned", resource.as_ref()))
    }

    /// Returns `true` for codec failures (either direction).
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::Decoding(_))
    }
}
