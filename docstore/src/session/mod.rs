//! Units of work over a [DocumentStore](crate::store::DocumentStore).
//!
//! A [Session] caches what it loads, tracks changes and commits them as one
//! atomic batch with optimistic concurrency checks.

mod entity;
mod options;
mod session;
mod tracking;

pub use entity::*;
pub use options::*;
pub use session::*;
pub(crate) use tracking::TrackedEntity;
pub use tracking::TrackingState;
