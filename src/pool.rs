//! Bounded-concurrency fan-out over a fixed list of work items.
//!
//! Units run on the calling task, interleaved at their await points, with at
//! most `max_concurrency` in flight. A failing unit never cancels its
//! siblings. Callers that need per-item results pre-allocate one slot per
//! item and hand each unit its own slot.

use std::future::Future;
use std::pin::pin;

use futures::StreamExt;
use futures::stream::{self, FuturesUnordered};

/// Failure reported by [`run_bounded_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError<E, C> {
    /// At least one unit failed; this is the first failure observed.
    Unit(E),
    /// Dispatch stopped early because the cancellation signal fired.
    Cancelled(C),
}

/// Runs `work` over every item with at most `max_concurrency` units in flight.
///
/// The effective ceiling is `min(max_concurrency, items.len())`, and never
/// below one. Every item is dispatched and every unit runs to completion.
///
/// # Errors
///
/// Returns the first unit failure observed, after all units have finished.
pub async fn run_bounded<I, T, E, F, Fut>(
    items: I,
    max_concurrency: usize,
    work: F,
) -> Result<(), E>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let queued: Vec<T> = items.into_iter().collect();
    if queued.is_empty() {
        return Ok(());
    }
    let limit = effective_limit(max_concurrency, queued.len());

    stream::iter(queued)
        .map(work)
        .buffer_unordered(limit)
        .fold(Ok(()), |outcome, result| async move { outcome.and(result) })
        .await
}

/// Like [`run_bounded`], but stops dispatching once `cancel` resolves.
///
/// Units already in flight when the signal fires are allowed to finish;
/// queued items are never started.
///
/// # Errors
///
/// Returns [`PoolError::Cancelled`] carrying the signal's output when
/// dispatch stopped early, otherwise [`PoolError::Unit`] with the first unit
/// failure observed.
pub async fn run_bounded_until<I, T, E, F, Fut, C>(
    items: I,
    max_concurrency: usize,
    cancel: C,
    mut work: F,
) -> Result<(), PoolError<E, C::Output>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    C: Future,
{
    let mut queued = items.into_iter().peekable();
    if queued.peek().is_none() {
        return Ok(());
    }

    let mut signal = pin!(cancel);
    let mut in_flight = FuturesUnordered::new();
    let mut first_failure: Option<E> = None;
    let mut cancelled = None;

    for item in queued.by_ref().take(max_concurrency.max(1)) {
        in_flight.push(work(item));
    }

    while !in_flight.is_empty() {
        tokio::select! {
            biased;
            cause = &mut signal, if cancelled.is_none() => {
                cancelled = Some(cause);
            }
            Some(result) = in_flight.next() => {
                if let Err(error) = result {
                    first_failure.get_or_insert(error);
                }
                if cancelled.is_none() {
                    if let Some(item) = queued.next() {
                        in_flight.push(work(item));
                    }
                }
            }
        }
    }

    match (cancelled, first_failure) {
        (Some(cause), _) => Err(PoolError::Cancelled(cause)),
        (None, Some(error)) => Err(PoolError::Unit(error)),
        (None, None) => Ok(()),
    }
}

fn effective_limit(max_concurrency: usize, item_count: usize) -> usize {
    max_concurrency.clamp(1, item_count.max(1))
}
