//! Error types for URI building and response handling.
//!
//! Parsing and joining are the only fallible URI operations; everything else on
//! [`Uri`](crate::Uri) is total. Response errors keep the raw body around so a
//! bad payload can be inspected after the fact.

use http::StatusCode;

/// The main error type for this crate.
///
/// # Examples
///
/// ```
/// use springboard::{Error, Uri};
///
/// match Uri::parse("not a uri") {
///     Err(Error::InvalidUri { input, source }) => {
///         assert_eq!(input, "not a uri");
///         eprintln!("parse failed: {}", source);
///     }
///     other => panic!("expected InvalidUri, got {:?}", other),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A string could not be parsed or resolved into a URI.
    ///
    /// Returned by [`Uri::parse`](crate::Uri::parse), [`Uri::join`](crate::Uri::join)
    /// and the operations built on them.
    ///
    /// # Fields
    ///
    /// * `input` - The string that failed to parse or resolve
    /// * `source` - The error reported by the `url` parser
    #[error("Invalid URI {input:?}: {source}")]
    InvalidUri {
        /// The offending input
        input: String,
        /// The underlying parser error
        #[source]
        source: url::ParseError,
    },

    /// The response body could not be deserialized as JSON.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code of the response
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Reading the body of a transport response failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn invalid_uri(input: impl Into<String>, source: url::ParseError) -> Self {
        Error::InvalidUri {
            input: input.into(),
            source,
        }
    }

    /// Returns `true` if this error came from URI parsing or joining.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::Uri;
    ///
    /// let err = Uri::parse("/relative/only").unwrap_err();
    /// assert!(err.is_invalid_uri());
    /// ```
    pub fn is_invalid_uri(&self) -> bool {
        matches!(self, Error::InvalidUri { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            Error::InvalidUri { .. } => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
