//! `admin-fetch` holds two helpers for admin REST clients:
//!
//! - [`fetch_with_error`] / [`Fetcher::fetch_with_error`] send a request and
//!   turn any non-2xx response into a [`NetworkError`] whose message is
//!   derived from the response body.
//! - [`retry`] re-runs an async operation with a linear backoff while its
//!   failures look transient (status >= 500 or an `unknown_error` message).

mod error;
mod fetch;
mod message;
mod options;
mod retry;

pub use error::{FetchError, NetworkError, ResponseParts};
pub use fetch::{fetch_with_error, parse_response, FetchInput, Fetcher};
pub use message::{error_message, preview, PREVIEW_LIMIT};
pub use options::{RequestInit, RetryOptions};
pub use retry::{
    backoff_delay, retry, retry_default, retry_with_report, GiveUp, RetryError,
    RetryableFailure, UNKNOWN_ERROR_MARKER,
};

pub type Result<T> = std::result::Result<T, FetchError>;
