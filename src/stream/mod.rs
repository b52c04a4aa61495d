//! Stream combinators for record streams

mod aggregate;

pub use aggregate::{AggregateEvents, AggregateExt, TryAggregateEvents, TryAggregateExt};
