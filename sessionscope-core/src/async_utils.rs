//! Async utilities and patterns
//!
//! Timeouts for backend calls and ordered fan-out across courses.

use crate::error::{ErrorContext, ScopeError, ScopeResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Run a fallible backend call under a timeout.
///
/// An elapsed timeout is reported as a retrieval failure, the same as any
/// other backend error.
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> ScopeResult<T>
where
    F: std::future::Future<Output = ScopeResult<T>>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation = operation_name,
                timeout_ms = timeout_ms,
                "Backend call timed out"
            );
            Err(ScopeError::RetrievalFailure {
                message: format!("{} timed out after {}ms", operation_name, timeout_ms),
                source: None,
                context: ErrorContext::new("async_utils")
                    .with_operation(operation_name)
                    .with_metadata("timeout_ms", &timeout_ms.to_string())
                    .with_suggestion("Increase retrieval.backend_timeout_ms")
                    .with_suggestion("Verify backend availability"),
            })
        }
    }
}

/// Process items concurrently, keeping results in input order.
///
/// At most `max_concurrent` futures are in flight. The first error (in input
/// order) aborts the whole run and no partial output is returned.
pub async fn try_join_ordered<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    processor: F,
) -> ScopeResult<Vec<R>>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = ScopeResult<R>>,
{
    stream::iter(items)
        .map(processor)
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await
}
