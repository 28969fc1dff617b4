//! Bounded concurrent execution of fallible futures

use futures::future::BoxFuture;
use futures::{StreamExt, TryStreamExt, stream};

/// Run `tasks` with at most `limit` of them in flight at once.
///
/// Results come back in the order the tasks were given. The first error
/// aborts the gather: futures still pending are dropped, which cancels any
/// query they were awaiting.
pub async fn gather_with_concurrency<'a, T, E>(
    limit: usize,
    tasks: Vec<BoxFuture<'a, Result<T, E>>>,
) -> Result<Vec<T>, E>
where
    T: Send + 'a,
    E: Send + 'a,
{
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    stream::iter(tasks)
        .buffered(limit.max(1))
        .try_collect()
        .await
}
