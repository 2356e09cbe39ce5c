//! Skill DAG engine (C4): builds an execution order from a skill's workflow
//! nodes, then runs it level by level with bounded concurrency.

mod engine;
mod leveling;
mod reference;

pub use engine::{run_skill, run_skill_with_concurrency, DEFAULT_MAX_CONCURRENCY};
pub use leveling::compute_levels;
pub use reference::resolve_reference;
