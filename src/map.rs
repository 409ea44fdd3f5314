//! Entry points: one-shot [`map`] and the curried [`Mapper`].

use crate::budget::Budget;
use crate::common::Transform;
use crate::ordered::BoundedMap;

/// Maps `transform` over `items`, running at most `budget` transforms at a
/// time. The returned future resolves to the outputs in input order, or to
/// the first error a transform produced.
///
/// ```rust
/// use futures_asyncmap::{map, Budget};
///
/// let out = tokio_test::block_on(map(
///     Budget::new(10).unwrap(),
///     |x: u64, _: usize| async move { Ok::<_, String>(x * 2) },
///     0..20,
/// ));
/// assert_eq!(out.unwrap(), (0..20).map(|x| x * 2).collect::<Vec<_>>());
/// ```
pub fn map<I, T>(budget: Budget, transform: T, items: I) -> BoundedMap<I::IntoIter, T>
where
    I: IntoIterator,
    T: Transform<I::Item>,
{
    BoundedMap::new(budget, transform, items)
}

/// Binds a budget and a transform, leaving only the inputs to be supplied.
///
/// ```rust
/// use futures_asyncmap::{mapper, Budget};
///
/// let increment = mapper(Budget::new(2).unwrap(), |x: u32, _: usize| async move {
///     Ok::<_, String>(x + 1)
/// });
///
/// tokio_test::block_on(async {
///     assert_eq!(increment.map(vec![1, 2, 3]).await.unwrap(), vec![2, 3, 4]);
///     assert_eq!(increment.map(vec![41]).await.unwrap(), vec![42]);
/// });
/// ```
pub fn mapper<T>(budget: Budget, transform: T) -> Mapper<T> {
    Mapper { budget, transform }
}

/// Curried form of [`map`].
///
/// A `Mapper` keeps no per-operation state. Every call to [`Mapper::map`]
/// clones the transform into a fresh [`BoundedMap`], so operations started
/// from the same `Mapper` never see each other's counters or slots, even
/// when they run at the same time.
#[derive(Debug, Clone)]
pub struct Mapper<T> {
    budget: Budget,
    transform: T,
}

impl<T> Mapper<T> {
    /// Starts a new operation over `items` with a clone of the transform.
    pub fn map<I>(&self, items: I) -> BoundedMap<I::IntoIter, T>
    where
        I: IntoIterator,
        T: Transform<I::Item> + Clone,
    {
        BoundedMap::new(self.budget, self.transform.clone(), items)
    }

    /// Budget every operation from this `Mapper` runs with.
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Gives back the bound transform.
    pub fn into_inner(self) -> T {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use futures::future;

    use super::*;
    use crate::common::from_sync;

    #[tokio::test]
    async fn test_map_sync_and_async() {
        let budget = Budget::new(2).unwrap();

        let double = from_sync(|x: i32, _: usize| Ok::<_, String>(x * 2));
        let out = map(budget, double, vec![1, 2, 3, 4]).await;
        assert_eq!(out, Ok(vec![2, 4, 6, 8]));

        let out = map(
            budget,
            |x: i32, _: usize| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, String>(x * 3)
            },
            vec![1, 2, 3],
        )
        .await;
        assert_eq!(out, Ok(vec![3, 6, 9]));
    }

    #[tokio::test]
    async fn test_map_propagates_error_unchanged() {
        let out = map(
            Budget::new(2).unwrap(),
            from_sync(|x: i32, _: usize| {
                if x == 2 {
                    return Err("fail!".to_string());
                }
                Ok(x)
            }),
            vec![1, 2, 3],
        )
        .await;
        assert_eq!(out, Err("fail!".to_string()));
    }

    #[tokio::test]
    async fn test_mapper_is_reusable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let increment = mapper(Budget::new(2).unwrap(), move |x: u32, _: usize| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, String>(x + 1) }
        });

        assert_eq!(increment.map(vec![1, 2, 3]).await, Ok(vec![2, 3, 4]));
        assert_eq!(increment.map(Vec::<u32>::new()).await, Ok(vec![]));
        assert_eq!(increment.map(vec![9]).await, Ok(vec![10]));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(increment.budget().get(), 2);

        let mut transform = increment.into_inner();
        assert_eq!(transform.dispatch(41, 0).unwrap().await, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_concurrent_operations_are_independent() {
        let slow = mapper(Budget::new(2).unwrap(), |x: u64, index: usize| async move {
            tokio::time::sleep(Duration::from_millis(x)).await;
            if x == 99 {
                return Err(index);
            }
            Ok(x * 2)
        });

        let (a, b, c) = future::join3(
            slow.map(vec![5, 1, 3]),
            slow.map(vec![2, 4, 6, 8]),
            slow.map(vec![1, 99, 2]),
        )
        .await;
        assert_eq!(a, Ok(vec![10, 2, 6]));
        assert_eq!(b, Ok(vec![4, 8, 12, 16]));
        // One failing operation leaves its siblings untouched.
        assert_eq!(c, Err(1));
    }
}
