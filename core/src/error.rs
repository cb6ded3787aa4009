//! Error types for the Dog API client core.
//!
//! # Design
//! Request-side failures (`UrlMissing`, `Parsing`) are raised by `build_*`
//! before anything touches the network. Response-side failures come from
//! `parse_*`: the status is checked first, so a non-2xx response surfaces as
//! `BadStatus` and never reaches the JSON decoder.

use thiserror::Error;

/// Errors returned by `DogClient` build/parse methods and `DogApi` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request URL could not be constructed from the configured base.
    #[error("request url could not be constructed")]
    UrlMissing,

    /// The request payload could not be encoded.
    #[error("request encoding failed: {0}")]
    Parsing(String),

    /// The response body could not be decoded into the expected type.
    #[error("response decoding failed: {0}")]
    Decoding(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// The server answered 204 where a body was expected.
    #[error("response had no content")]
    NoContent,

    /// The transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadStatus { status, .. } => Some(*status),
            ApiError::NoContent => Some(204),
            _ => None,
        }
    }
}

/// Errors raised while assembling a `ClientConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DOG_API_KEY is not set")]
    MissingApiKey,

    #[error("{0} must not be empty")]
    Empty(&'static str),
}
