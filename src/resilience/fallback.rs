//! Failure Boundaries
//!
//! Two ways to stop a failure from escaping an async operation:
//! `error_to_value` turns it into an `ApiError`, and `swallow_error` logs it
//! and yields `None`. Both also catch panics raised while polling.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::api_error::{ApiError, ErrorContext};

/// Run `future`, converting any error or panic into an `ApiError`
pub async fn error_to_value<T, E, Fut>(future: Fut) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, E>>,
    E: ErrorContext,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            let error = ApiError::from_error(&e);
            tracing::error!("Run failed: {}", error);
            Err(error)
        }
        Err(payload) => {
            let error = ApiError::from_panic(payload.as_ref());
            tracing::error!("Run panicked: {}", error.message);
            Err(error)
        }
    }
}

/// Run `future`, logging any error or panic under `label` and yielding `None`
pub async fn swallow_error<T, E, Fut>(label: &str, future: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::error!("{} failed: {}", label, e);
            None
        }
        Err(payload) => {
            let error = ApiError::from_panic(payload.as_ref());
            tracing::error!("{} panicked: {}", label, error.message);
            None
        }
    }
}
