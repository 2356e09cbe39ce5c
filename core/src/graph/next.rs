//! Routing decision returned by a node's `run`.

/// What the graph runner should do after a node finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    /// Follow the linear edge order (or the conditional router, if one is registered).
    Continue,
    /// Jump directly to the named node, bypassing linear order and conditional routing.
    Node(String),
    /// Stop the run; the current state is final.
    End,
}
