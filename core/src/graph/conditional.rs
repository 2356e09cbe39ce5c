//! Conditional edges: route to the next node based on state after a node runs.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A routing function: given the state after a node ran, return a key.
///
/// The key is either a node id directly, or looked up in a `path_map`.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// A conditional router attached to one source node: a routing function plus an
/// optional key→node-id map.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub path: ConditionalRouterFn<S>,
    pub path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S> {
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id (or `END`) for the given state.
    pub fn resolve(&self, state: &S) -> String {
        let key = (self.path)(state);
        match &self.path_map {
            Some(map) => map.get(&key).cloned().unwrap_or(key),
            None => key,
        }
    }
}

/// What a compiled graph does after a given node, resolved at compile time.
#[derive(Clone)]
pub enum NextEntry<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Always goes to the same node (or END).
    Unconditional(String),
    /// Routes based on state via a `ConditionalRouter`.
    Conditional(ConditionalRouter<S>),
}
