//! Batch Tools


use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::task::JoinError;

/// Batch execute async operations with bounded concurrency.
///
/// Results come back in input order.
pub async fn batch<T, F, Fut, R>(items: Vec<T>, concurrency: usize, operation: F) -> Vec<R>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    stream::iter(items)
        .map(operation)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Like [`batch`], for CPU-bound work: each item runs on the blocking pool.
///
/// A panicking item surfaces as its own `JoinError` and does not affect the others.
pub async fn batch_blocking<T, F, R>(
    items: Vec<T>,
    concurrency: usize,
    operation: F,
) -> Vec<Result<R, JoinError>>
where
    T: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let operation = Arc::new(operation);
    batch(items, concurrency, move |item| {
        let operation = Arc::clone(&operation);
        tokio::task::spawn_blocking(move || operation(item))
    })
    .await
}
