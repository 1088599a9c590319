//! Action dispatch strategies.
//!
//! Immediate answers each snapshot synchronously with the full lane state;
//! deferred schedules latency-compensated press/release pairs as timed
//! tasks. Both write through the session's single outbound line channel.

mod deferred;
mod immediate;

pub use deferred::DeferredDispatcher;
pub use immediate::ImmediateDispatcher;
