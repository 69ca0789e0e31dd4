use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;

/// Pause between consecutive concurrency windows.
pub const DEFAULT_WINDOW_DELAY: Duration = Duration::from_millis(800);

/// Run `worker` over `items` in consecutive windows of `window_size`.
///
/// Every item in a window runs concurrently; the scheduler waits for the
/// whole window to settle, pauses `window_delay`, then starts the next
/// window. No pause follows the final window. Results are collected
/// positionally, so `result[i]` always corresponds to `items[i]`
/// regardless of completion order.
///
/// Workers are infallible at the type level: a worker that can fail must
/// absorb its own error and encode it in `R` (a tagged outcome), so one
/// bad item never cancels its siblings or aborts the batch. The
/// scheduler performs no retries and supports no cancellation.
pub async fn run_windows<T, R, F, Fut>(
    items: Vec<T>,
    window_size: usize,
    window_delay: Duration,
    worker: F,
) -> Vec<R>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = R>,
{
    let window_size = window_size.max(1);
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut remaining = items.into_iter().enumerate();

    loop {
        let window: Vec<_> = remaining.by_ref().take(window_size).collect();
        if window.is_empty() {
            break;
        }

        let tasks = window.into_iter().map(|(index, item)| worker(item, index));
        results.extend(join_all(tasks).await);

        if results.len() < total && !window_delay.is_zero() {
            tokio::time::sleep(window_delay).await;
        }
    }

    results
}
