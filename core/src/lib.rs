//! # orch-core
//!
//! The orchestration engine: a provider-agnostic LLM gateway, a six-node ReAct
//! agent loop, a tool executor, and a skill DAG engine, built on a small
//! graph-execution core shared by all of them.
//!
//! ## Design principles
//!
//! - **Single state type**: the ReAct graph uses one state struct
//!   ([`AgentState`]) that every node reads from and writes to.
//! - **One step per run**: each [`Node`] implementation receives state and
//!   returns updated state plus a [`Next`] routing decision.
//! - **State graphs**: [`StateGraph`] composes nodes with linear and
//!   conditional edges; [`StateGraph::compile`] validates the wiring once,
//!   up front.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`],
//!   [`RunContext`] — the generic graph engine everything else is built on.
//! - [`llm`]: [`LlmClient`], [`ChatParams`], [`ProviderGateway`] and the
//!   OpenAI-compatible/Anthropic adapters behind it.
//! - [`agent::react`]: the six ReAct nodes (`plan`, `think`, `execute_tools`,
//!   `validate`, `respond`, `error`) and [`agent::react::build_react_graph`].
//! - [`executor`]: [`executor::ToolExecutor`], dispatching a named tool call
//!   to a built-in handler or a catalog-backed adapter.
//! - [`dag`]: the skill DAG engine — [`dag::run_skill`], [`dag::compute_levels`],
//!   [`dag::resolve_reference`].
//! - [`catalog`]: [`catalog::Catalog`] and the tool/skill/user types it stores.
//! - [`permission`]: [`permission::may`], the permission filter (C6).
//! - [`message`]: [`Message`], the conversation message type shared by the
//!   gateway, the ReAct nodes, and the tool executor.
//! - [`state`]: [`AgentState`] and the types threaded through the ReAct graph.
//! - [`stream`]: [`stream::StreamEvent`], [`stream::StreamMode`] for streamed runs.
//! - [`channels`]: state-merge strategies for node outputs.
//! - [`memory`]: per-conversation checkpoint persistence.
//! - [`conversation`]: [`conversation::ConversationStore`], appending a
//!   completed turn plus its thinking-step log at end-of-stream.
//! - [`tool_source`]: [`tool_source::ToolSpec`], [`tool_source::ToolCallContext`]
//!   shared by built-in tool implementations.
//! - [`tools`]: built-in tools dispatched ahead of the catalog, e.g. [`tools::CalculatorTool`].
//! - [`error`]: [`AgentError`] and the error types it wraps.

pub mod agent;
pub mod catalog;
pub mod channels;
pub mod conversation;
pub mod dag;
pub mod error;
pub mod executor;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod permission;
pub mod state;
pub mod stream;
pub mod tool_source;
pub mod tools;

pub use channels::{boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
pub use conversation::{ConversationStore, ConversationStoreError, ConversationTurn, MockConversationStore, ThinkingStepRecord};
pub use error::{AgentError, ProviderError, ToolExecutionError};
pub use graph::{
    CompilationError, CompiledStateGraph, ConditionalRouter, ConditionalRouterFn, LoggingNodeMiddleware,
    NameNode, Next, NextEntry, Node, NodeMiddleware, RunContext, StateGraph, END, START,
};
pub use llm::{
    infer_provider_kind, AnthropicAdapter, ChatParams, LlmClient, LlmResponse, LlmUsage, MockLlm,
    OpenAiCompatibleAdapter, ProviderGateway, ProviderKind, ProviderRecord, ToolCallDelta, ToolChoiceMode,
};
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, Serializer, SqliteSaver,
};
pub use message::{Message, Role, ToolArguments};
pub use permission::may;
pub use state::{
    AgentState, AgentStatus, PlanningRecord, ToolCall, ToolResult, ValidationIssue, ValidationStatus,
};
pub use stream::{
    ChunkToStreamSender, MessageChunk, StreamEvent, StreamMetadata, StreamMode, StreamWriter,
    ToolStreamWriter,
};
pub use tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
pub use tools::{BuiltinTool, CalculatorTool, TOOL_CALCULATOR};
