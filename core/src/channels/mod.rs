//! State-merge strategies for graph node outputs.

mod updater;

pub use updater::{boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
