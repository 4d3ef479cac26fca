//! Type definitions

pub mod schedule;
pub mod snapshot;

pub use schedule::*;
pub use snapshot::Snapshot;
