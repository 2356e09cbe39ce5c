//! Agent orchestration: the ReAct graph (C2) that ties the provider gateway,
//! tool executor, and permission filter together for one chat turn.

pub mod react;
