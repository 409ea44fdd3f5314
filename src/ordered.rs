//! Order-preserving bounded map over an input sequence.

use std::fmt;
use std::future::Future;
use std::iter::Enumerate;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, FusedFuture};
use futures::stream::{FuturesUnordered, Stream};
use pin_project::pin_project;
use tracing::{debug, trace};

use crate::budget::Budget;
use crate::common::Transform;

/// A dispatched transform, remembering the input index it belongs to.
#[pin_project]
struct Tagged<F> {
    index: usize,
    #[pin]
    inner: F,
}

impl<F: Future> Future for Tagged<F> {
    type Output = (usize, F::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let index = *this.index;
        this.inner.poll(cx).map(|output| (index, output))
    }
}

/// One mapping operation: runs `transform` over every input while keeping at
/// most `budget` transforms in flight, and resolves to the outputs in input
/// order.
///
/// Inputs are dispatched strictly in input order. Completions may arrive in
/// any order; each output lands in the slot of the index it was dispatched
/// for, so the result never depends on completion order.
///
/// The first failure resolves the operation right away, whether the
/// transform failed at dispatch or its future failed later. Nothing new is
/// dispatched after that. Transforms already in flight are not cancelled:
/// they stay inside the resolved operation, and a caller holding on to it
/// can drive them to completion with [`BoundedMap::drain`]. Their results
/// are discarded. Dropping the operation drops them, which is the only way
/// to cancel.
///
/// ```rust
/// use std::time::Duration;
/// use futures_asyncmap::{map, Budget};
///
/// let op = map(Budget::new(2).unwrap(), |x: u64, _: usize| async move {
///     // Later items finish first.
///     tokio::time::sleep(Duration::from_millis(5 * (5 - x))).await;
///     Ok::<_, String>(x * 10)
/// }, vec![1, 2, 3, 4]);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// assert_eq!(rt.block_on(op), Ok(vec![10, 20, 30, 40]));
/// ```
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct BoundedMap<I, T>
where
    I: Iterator,
    T: Transform<I::Item>,
{
    budget: Budget,
    cursor: Enumerate<I>,
    exhausted: bool,
    transform: T,
    #[pin]
    running: FuturesUnordered<Tagged<T::Future>>,
    slots: Vec<Option<T::Ok>>,
    completed: usize,
    drained: usize,
    failed: bool,
    terminated: bool,
}

impl<I, T> BoundedMap<I, T>
where
    I: Iterator,
    T: Transform<I::Item>,
{
    /// Creates the operation. Nothing is dispatched until the first poll.
    pub fn new<II>(budget: Budget, transform: T, items: II) -> Self
    where
        II: IntoIterator<IntoIter = I>,
    {
        let cursor = items.into_iter().enumerate();
        let (len_hint, _) = cursor.size_hint();
        Self {
            budget,
            cursor,
            exhausted: false,
            transform,
            running: FuturesUnordered::new(),
            slots: Vec::with_capacity(len_hint),
            completed: 0,
            drained: 0,
            failed: false,
            terminated: false,
        }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Number of transforms dispatched and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Number of inputs taken from the cursor so far, including one whose
    /// transform failed at dispatch.
    pub fn dispatched(&self) -> usize {
        self.slots.len()
    }

    /// Number of outputs stored in their slots.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Whether the operation resolved with a failure.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Polls the transforms left in flight by a failed operation, discarding
    /// whatever they produce. Resolves to the number of them that finished
    /// once none are left.
    ///
    /// Does nothing until the operation itself has resolved.
    pub fn poll_in_flight(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<usize> {
        let mut this = self.project();
        if !*this.terminated {
            return Poll::Ready(0);
        }
        loop {
            match this.running.as_mut().poll_next(cx) {
                Poll::Ready(Some((index, result))) => {
                    *this.drained += 1;
                    trace!(index, failed = result.is_err(), "Drained transform");
                }
                Poll::Ready(None) => return Poll::Ready(*this.drained),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    /// Runs [`BoundedMap::poll_in_flight`] to completion.
    pub async fn drain(mut self: Pin<&mut Self>) -> usize {
        future::poll_fn(|cx| self.as_mut().poll_in_flight(cx)).await
    }
}

impl<I, T> Future for BoundedMap<I, T>
where
    I: Iterator,
    T: Transform<I::Item>,
{
    type Output = Result<Vec<T::Ok>, T::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        assert!(!*this.terminated, "`BoundedMap` polled after completion");

        loop {
            // Fill the budget, lowest untaken index first.
            while !*this.exhausted && this.running.len() < this.budget.get() {
                let Some((index, item)) = this.cursor.next() else {
                    *this.exhausted = true;
                    break;
                };
                this.slots.push(None);
                match this.transform.dispatch(item, index) {
                    Ok(inner) => {
                        this.running.push(Tagged { index, inner });
                        trace!(index, in_flight = this.running.len(), "Dispatched transform");
                    }
                    Err(err) => {
                        debug!(index, in_flight = this.running.len(), "Transform failed at dispatch");
                        *this.terminated = true;
                        *this.failed = true;
                        return Poll::Ready(Err(err));
                    }
                }
            }

            match this.running.as_mut().poll_next(cx) {
                Poll::Ready(Some((index, Ok(output)))) => {
                    this.slots[index] = Some(output);
                    *this.completed += 1;
                    trace!(index, in_flight = this.running.len(), "Transform completed");
                }
                Poll::Ready(Some((index, Err(err)))) => {
                    debug!(index, in_flight = this.running.len(), "Transform failed");
                    *this.terminated = true;
                    *this.failed = true;
                    return Poll::Ready(Err(err));
                }
                // Nothing in flight right after a dispatch pass means the
                // cursor is exhausted.
                Poll::Ready(None) => {
                    *this.terminated = true;
                    debug_assert_eq!(*this.completed, this.slots.len());
                    let outputs: Vec<_> = mem::take(this.slots).into_iter().flatten().collect();
                    debug!(len = outputs.len(), "Operation completed");
                    return Poll::Ready(Ok(outputs));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<I, T> FusedFuture for BoundedMap<I, T>
where
    I: Iterator,
    T: Transform<I::Item>,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<I, T> fmt::Debug for BoundedMap<I, T>
where
    I: Iterator,
    T: Transform<I::Item>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedMap")
            .field("budget", &self.budget)
            .field("in_flight", &self.in_flight())
            .field("dispatched", &self.dispatched())
            .field("completed", &self.completed)
            .field("failed", &self.failed)
            .field("terminated", &self.terminated)
            .finish()
    }
}
