//! The transform seam shared by every mapping flavor.

use std::future::Future;

use futures::future::{self, Ready};

/// A per-item transform, invoked once for every dispatched input.
///
/// `dispatch` starts the work for `item` (found at `index` in the input) and
/// returns a future that yields its output. Returning `Err` from `dispatch`
/// itself means the transform failed before producing a future; the mapper
/// treats it as a failure of that index and never writes its slot.
///
/// Any closure `FnMut(T, usize) -> Fut` where `Fut` resolves to a `Result`
/// is a `Transform`. Synchronous closures go through [`from_sync`].
pub trait Transform<T> {
    type Ok;
    type Error;
    type Future: Future<Output = Result<Self::Ok, Self::Error>>;

    fn dispatch(&mut self, item: T, index: usize) -> Result<Self::Future, Self::Error>;
}

impl<T, F, Fut, O, E> Transform<T> for F
where
    F: FnMut(T, usize) -> Fut,
    Fut: Future<Output = Result<O, E>>,
{
    type Ok = O;
    type Error = E;
    type Future = Fut;

    fn dispatch(&mut self, item: T, index: usize) -> Result<Fut, E> {
        Ok(self(item, index))
    }
}

/// Transform backed by a synchronous closure.
///
/// Successful values are lifted into an already completed future, so they
/// take the same completion path as asynchronous outputs.
#[derive(Debug, Clone, Copy)]
pub struct SyncFn<F> {
    f: F,
}

/// Wraps a synchronous `FnMut(T, usize) -> Result<O, E>` into a [`Transform`].
///
/// ```rust
/// use futures_asyncmap::{from_sync, map, Budget};
///
/// let double = from_sync(|x: u32, _: usize| Ok::<_, String>(x * 2));
/// let out = tokio_test::block_on(map(Budget::new(2).unwrap(), double, [1, 2, 3]));
/// assert_eq!(out, Ok(vec![2, 4, 6]));
/// ```
pub fn from_sync<F>(f: F) -> SyncFn<F> {
    SyncFn { f }
}

impl<F> SyncFn<F> {
    /// Gives back the wrapped closure.
    pub fn into_inner(self) -> F {
        self.f
    }
}

impl<T, F, O, E> Transform<T> for SyncFn<F>
where
    F: FnMut(T, usize) -> Result<O, E>,
{
    type Ok = O;
    type Error = E;
    type Future = Ready<Result<O, E>>;

    fn dispatch(&mut self, item: T, index: usize) -> Result<Self::Future, E> {
        (self.f)(item, index).map(future::ok)
    }
}
