//! Order-preserving asynchronous map with a bounded number of in-flight
//! transforms.
//!
//! `futures` already lets you run a batch of futures concurrently, but
//! mapping an async function over a list usually needs three more things:
//! an upper bound on how many calls run at once, outputs that come back in
//! the order of the inputs, and an early answer as soon as one call fails.
//! This crate packages exactly that as a single future.
//!
//! [`map`] takes a [`Budget`], a [`Transform`] and the inputs. It starts
//! transforms in input order until the budget is full, starts the next one
//! every time a running one completes, and resolves to a `Vec` of outputs
//! where `output[i]` always belongs to `input[i]`. The first error a
//! transform returns becomes the result of the whole call right away,
//! exactly as the transform returned it, and nothing new is started.
//! Transforms that were already running are not cancelled; they stay in the
//! resolved future and can be finished with [`BoundedMap::drain`].
//!
//! [`mapper`] pre-binds a budget and a transform and returns a [`Mapper`]
//! that can be applied to any number of input batches.
//!
//! Transforms can be `async` closures (anything `FnMut(T, usize) -> Fut`
//! with `Fut` resolving to a `Result`) or synchronous closures wrapped with
//! [`from_sync`]. A synchronous result is turned into an already completed
//! future, so both kinds follow the same path.
//!
//! The crate does not depend on an executor; the returned future runs
//! wherever it is polled.
pub mod budget;
pub mod common;
pub mod error;
pub mod map;
pub mod ordered;

pub use budget::Budget;
pub use common::{from_sync, SyncFn, Transform};
pub use error::Error;
pub use map::{map, mapper, Mapper};
pub use ordered::BoundedMap;
