//! Resilience wrappers
//!
//! Higher-order async helpers shared by the merger and the run boundary:
//! - `retry`: bounded retries with exponential backoff
//! - `fallback`: convert or swallow failures (and panics)
//! - `api_error`: the serializable error value a failed run produces

pub mod api_error;
pub mod fallback;
pub mod retry;

pub use api_error::{ApiError, ErrorContext, PANIC_ERROR_CODE, UNKNOWN_ERROR_CODE};
pub use fallback::{error_to_value, swallow_error};
pub use retry::{with_retry, with_retry_notify, RetryPolicy};
