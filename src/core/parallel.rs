use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Bounded, order-preserving concurrent map.
///
/// At most `limit` calls of `f` are in flight at once. Results are returned in
/// input order regardless of completion order. The first failure is returned
/// and the remaining in-flight calls are dropped. Cancelling `cancellation`
/// aborts the map with [`ActionError::Cancelled`].
pub async fn parallel_map<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    cancellation: &CancellationToken,
    f: F,
) -> Result<Vec<R>, ActionError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, ActionError>>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    if cancellation.is_cancelled() {
        return Err(ActionError::Cancelled);
    }

    let total = items.len();
    let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
    let mut in_flight = stream::iter(items.into_iter().enumerate().map(|(index, item)| {
        let fut = f(item);
        async move { (index, fut.await) }
    }))
    .buffer_unordered(limit.max(1));

    loop {
        let next = tokio::select! {
            _ = cancellation.cancelled() => return Err(ActionError::Cancelled),
            next = in_flight.next() => next,
        };
        match next {
            Some((index, result)) => results[index] = Some(result?),
            None => break,
        }
    }

    log::debug!("parallel_map completed {} items", total);
    Ok(results.into_iter().flatten().collect())
}
