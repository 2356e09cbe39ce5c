//! `/chat` SSE endpoint: compiles the ReAct graph (C2) for one turn, runs it
//! with streaming enabled, and translates the single merged event queue (C1
//! token/tool-call deltas plus C2 node-transition snapshots) into the
//! `thinking`/`tool_call`/`tool_result`/`message`/`error`/`done` SSE event set
//! (C5), per the two-producer-into-one-bounded-queue design.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use orchestra_core::agent::react::build_react_graph;
use orchestra_core::catalog::{Catalog, User};
use orchestra_core::conversation::{ConversationStore, ConversationTurn, ThinkingStepRecord};
use orchestra_core::graph::RunContext;
use orchestra_core::memory::RunnableConfig;
use orchestra_core::message::{Message, Role};
use orchestra_core::permission::may;
use orchestra_core::state::{AgentState, AgentStatus};
use orchestra_core::stream::{StreamEvent, StreamMode};
use orchestra_core::AgentError;

use orch_stream::{
    tool_call_display_title, tool_call_group, EnvelopeState, SseEvent, ThinkingStatus, ToolCallStatus,
};

use super::app::AppState;

/// Bounded capacity of the single queue bridging C1/C2 events into C5, per
/// spec.md §5: "process-local, bounded; producers block on backpressure".
const EVENT_QUEUE_CAPACITY: usize = 128;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub input: String,
    pub model_id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, (axum::http::StatusCode, Json<ErrorBody>)> {
    let session_id = req.session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let user = match &req.user_id {
        Some(id) => User { id: id.clone(), ..Default::default() },
        None => User::anonymous(),
    };
    let available_tools = state
        .catalog
        .list_tools()
        .into_iter()
        .filter(|tool| tool.is_active() && may(&user, tool))
        .map(|tool| tool.definition)
        .collect();

    let mut agent_state = AgentState::new(session_id.clone(), req.input, req.model_id);
    agent_state.user_id = req.user_id;
    agent_state.provider = req.provider;
    agent_state.temperature = req.temperature;
    agent_state.available_tools = available_tools;
    if let Some(cap) = req.max_iterations {
        agent_state.max_iterations = cap;
    }

    let graph = build_react_graph(state.gateway.clone(), state.executor.clone(), state.catalog.clone())
        .map_err(|e| {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: e.to_string() }),
            )
        })?;

    let (graph_tx, graph_rx) = mpsc::channel::<StreamEvent<AgentState>>(EVENT_QUEUE_CAPACITY);
    let (result_tx, result_rx) = oneshot::channel::<Result<AgentState, AgentError>>();
    let mut modes = std::collections::HashSet::new();
    modes.insert(StreamMode::Messages);
    modes.insert(StreamMode::Values);
    let config = RunnableConfig::new(session_id.clone());
    let ctx = RunContext::with_stream(config, graph_tx, modes);

    tokio::spawn(async move {
        let result = graph.invoke_with_context(agent_state, &ctx).await;
        let _ = result_tx.send(result);
    });

    let (frame_tx, frame_rx) = mpsc::channel::<serde_json::Value>(EVENT_QUEUE_CAPACITY);
    tokio::spawn(translate_events(
        session_id,
        graph_rx,
        result_rx,
        frame_tx,
        state.conversation_store.clone(),
    ));

    let stream = ReceiverStream::new(frame_rx).map(|frame| Ok(Event::default().data(frame.to_string())));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// One in-flight tool call's accumulated name/arguments, keyed by its
/// streaming position (see [`orchestra_core::llm::ToolCallDelta`]).
#[derive(Default)]
struct ToolCallAccumulator {
    id: Option<String>,
    name: String,
    arguments: String,
}

async fn send_frame(frame_tx: &mpsc::Sender<serde_json::Value>, envelope: &mut EnvelopeState, event: &SseEvent) {
    if let Ok(value) = envelope.to_json(event) {
        let _ = frame_tx.send(value).await;
    }
}

/// Converts a wire [`ThinkingStatus`] into the label persisted in a
/// [`ThinkingStepRecord`], matching the serialized SSE value.
fn thinking_status_label(status: ThinkingStatus) -> &'static str {
    match status {
        ThinkingStatus::InProgress => "in-progress",
        ThinkingStatus::Completed => "completed",
        ThinkingStatus::Failed => "failed",
    }
}

async fn translate_events(
    session_id: String,
    mut graph_rx: mpsc::Receiver<StreamEvent<AgentState>>,
    result_rx: oneshot::Receiver<Result<AgentState, AgentError>>,
    frame_tx: mpsc::Sender<serde_json::Value>,
    conversation_store: Arc<dyn ConversationStore>,
) {
    let mut envelope = EnvelopeState::new(session_id.clone());
    let mut calls: HashMap<usize, ToolCallAccumulator> = HashMap::new();
    let mut group_ids: HashMap<&'static str, String> = HashMap::new();
    let mut seen_messages = 0usize;
    let mut seen_status = AgentStatus::Thinking;
    let mut reported_planning = false;
    let mut thinking_steps: Vec<ThinkingStepRecord> = Vec::new();

    thinking_steps.push(ThinkingStepRecord {
        id: "think-0".to_string(),
        title: "thinking".to_string(),
        status: thinking_status_label(ThinkingStatus::InProgress).to_string(),
        content: String::new(),
        timestamp: Utc::now(),
        group: None,
    });
    send_frame(
        &frame_tx,
        &mut envelope,
        &SseEvent::Thinking {
            id: "think-0".to_string(),
            title: "thinking".to_string(),
            status: ThinkingStatus::InProgress,
            content: String::new(),
            accumulated: None,
            group: None,
        },
    )
    .await;

    while let Some(event) = graph_rx.recv().await {
        match event {
            StreamEvent::Messages(chunk) => {
                send_frame(&frame_tx, &mut envelope, &SseEvent::Message { content: chunk.content }).await;
            }
            StreamEvent::ToolCallChunk(delta) => {
                let entry = calls.entry(delta.index).or_default();
                if let Some(id) = delta.call_id {
                    entry.id = Some(id);
                }
                if let Some(name) = delta.name {
                    entry.name.push_str(&name);
                }
                entry.arguments.push_str(&delta.arguments_delta);

                if entry.name.is_empty() {
                    continue;
                }
                let group = tool_call_group(&entry.name);
                let group_id = group_ids
                    .entry(group.label())
                    .or_insert_with(|| uuid::Uuid::new_v4().to_string())
                    .clone();
                let arguments = serde_json::from_str(&entry.arguments)
                    .unwrap_or_else(|_| serde_json::json!({ "_raw_args": entry.arguments.clone() }));
                send_frame(
                    &frame_tx,
                    &mut envelope,
                    &SseEvent::ToolCall {
                        id: entry.id.clone().unwrap_or_default(),
                        name: entry.name.clone(),
                        display_title: tool_call_display_title(&entry.name, &arguments),
                        arguments,
                        status: ToolCallStatus::Calling,
                        group: group.label().to_string(),
                        group_id,
                        sub_item_type: "tool_call".to_string(),
                    },
                )
                .await;
            }
            StreamEvent::Values(state) => {
                if !reported_planning {
                    if let Some(planning) = &state.planning {
                        reported_planning = true;
                        thinking_steps.push(ThinkingStepRecord {
                            id: "plan-0".to_string(),
                            title: "planning".to_string(),
                            status: thinking_status_label(ThinkingStatus::Completed).to_string(),
                            content: planning.summary.clone(),
                            timestamp: Utc::now(),
                            group: None,
                        });
                        send_frame(
                            &frame_tx,
                            &mut envelope,
                            &SseEvent::Thinking {
                                id: "plan-0".to_string(),
                                title: "planning".to_string(),
                                status: ThinkingStatus::Completed,
                                content: planning.summary.clone(),
                                accumulated: Some(planning.summary.clone()),
                                group: None,
                            },
                        )
                        .await;
                    }
                }

                if matches!(seen_status, AgentStatus::Thinking) && !matches!(state.status, AgentStatus::Thinking) {
                    thinking_steps.push(ThinkingStepRecord {
                        id: "think-0".to_string(),
                        title: "thinking".to_string(),
                        status: thinking_status_label(ThinkingStatus::Completed).to_string(),
                        content: state.reasoning_text.clone().unwrap_or_default(),
                        timestamp: Utc::now(),
                        group: None,
                    });
                    send_frame(
                        &frame_tx,
                        &mut envelope,
                        &SseEvent::Thinking {
                            id: "think-0".to_string(),
                            title: "thinking".to_string(),
                            status: ThinkingStatus::Completed,
                            content: state.reasoning_text.clone().unwrap_or_default(),
                            accumulated: state.reasoning_text.clone(),
                            group: None,
                        },
                    )
                    .await;
                }
                seen_status = state.status;

                for message in state.messages.iter().skip(seen_messages) {
                    if message.role != Some(Role::Tool) {
                        continue;
                    }
                    let success = !message.content.starts_with("Error:");
                    let error_detail = message.content.strip_prefix("Error: ").unwrap_or(&message.content).to_string();
                    let name = message.name.clone().unwrap_or_default();
                    let call_id = message.tool_call_id.clone().unwrap_or_default();

                    if let Some((_, acc)) = calls.iter().find(|(_, acc)| acc.id.as_deref() == Some(call_id.as_str())) {
                        let group = tool_call_group(&acc.name);
                        let group_id = group_ids.get(group.label()).cloned().unwrap_or_default();
                        let arguments = serde_json::from_str(&acc.arguments).unwrap_or(serde_json::Value::Null);
                        send_frame(
                            &frame_tx,
                            &mut envelope,
                            &SseEvent::ToolCall {
                                id: call_id.clone(),
                                name: acc.name.clone(),
                                display_title: tool_call_display_title(&acc.name, &arguments),
                                arguments,
                                status: if success { ToolCallStatus::Done } else { ToolCallStatus::Failed },
                                group: group.label().to_string(),
                                group_id,
                                sub_item_type: "tool_call".to_string(),
                            },
                        )
                        .await;
                    }

                    send_frame(
                        &frame_tx,
                        &mut envelope,
                        &SseEvent::ToolResult {
                            id: call_id,
                            name,
                            result: message.content.clone(),
                            success,
                            error: if success { None } else { Some(error_detail) },
                        },
                    )
                    .await;
                }
                seen_messages = state.messages.len();
            }
            StreamEvent::Usage(_) | StreamEvent::Updates(_) | StreamEvent::Custom(_) => {}
        }
    }

    match result_rx.await {
        Ok(Ok(final_state)) => {
            let turn = ConversationTurn {
                conversation_id: final_state.session_id.clone(),
                owner_user_id: final_state.user_id.clone(),
                user_message: Message::user(final_state.input.clone()),
                assistant_message: Message::assistant(final_state.final_response.clone().unwrap_or_default()),
                thinking_steps,
                created_at: Utc::now(),
            };
            let _ = conversation_store.append_turn(turn).await;
            send_frame(&frame_tx, &mut envelope, &SseEvent::Done {}).await;
        }
        Ok(Err(e)) => {
            send_frame(
                &frame_tx,
                &mut envelope,
                &SseEvent::Error { code: "agent_error".to_string(), message: e.to_string() },
            )
            .await;
            send_frame(&frame_tx, &mut envelope, &SseEvent::Done {}).await;
        }
        Err(_) => {
            send_frame(
                &frame_tx,
                &mut envelope,
                &SseEvent::Error { code: "internal".to_string(), message: "agent task dropped".to_string() },
            )
            .await;
            send_frame(&frame_tx, &mut envelope, &SseEvent::Done {}).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::conversation::MockConversationStore;
    use orchestra_core::llm::ToolCallDelta;

    fn events_of(frames: &[serde_json::Value]) -> Vec<String> {
        frames.iter().filter_map(|f| f["event"].as_str().map(str::to_string)).collect()
    }

    /// A tool call streamed across three chunks (id+partial name, name
    /// completion, two argument fragments) accumulates into one coherent
    /// `tool_call` frame with parsed arguments.
    #[tokio::test]
    async fn three_chunk_tool_call_accumulates_into_one_frame() {
        let (graph_tx, graph_rx) = mpsc::channel(8);
        let (result_tx, result_rx) = oneshot::channel();
        let (frame_tx, mut frame_rx) = mpsc::channel(8);

        let conversation_store: Arc<dyn ConversationStore> = Arc::new(MockConversationStore::new());
        let handle = tokio::spawn(translate_events(
            "sess-1".to_string(),
            graph_rx,
            result_rx,
            frame_tx,
            conversation_store,
        ));

        graph_tx
            .send(StreamEvent::ToolCallChunk(ToolCallDelta {
                index: 0,
                call_id: Some("call_1".to_string()),
                name: Some("calc".to_string()),
                arguments_delta: "{\"a\":".to_string(),
            }))
            .await
            .unwrap();
        graph_tx
            .send(StreamEvent::ToolCallChunk(ToolCallDelta {
                index: 0,
                call_id: None,
                name: Some("ulator".to_string()),
                arguments_delta: "1,\"b\":".to_string(),
            }))
            .await
            .unwrap();
        graph_tx
            .send(StreamEvent::ToolCallChunk(ToolCallDelta {
                index: 0,
                call_id: None,
                name: None,
                arguments_delta: "2}".to_string(),
            }))
            .await
            .unwrap();
        drop(graph_tx);

        let mut state = AgentState::new("sess-1", "add", "mock");
        state.status = AgentStatus::Done;
        state.final_response = Some("3".to_string());
        let _ = result_tx.send(Ok(state));

        let mut frames = Vec::new();
        while let Some(frame) = frame_rx.recv().await {
            frames.push(frame);
        }
        handle.await.unwrap();

        let tool_call_frames: Vec<_> =
            frames.iter().filter(|f| f["event"] == "tool_call").map(|f| f["data"].as_str().unwrap()).collect();
        assert_eq!(tool_call_frames.len(), 3, "one frame per chunk once the name is known");

        let last: serde_json::Value = serde_json::from_str(tool_call_frames.last().unwrap()).unwrap();
        assert_eq!(last["name"], "calculator");
        assert_eq!(last["arguments"], serde_json::json!({"a": 1, "b": 2}));
        assert_eq!(last["id"], "call_1");
        assert_eq!(last["status"], "calling");

        assert_eq!(events_of(&frames).first(), Some(&"thinking".to_string()));
        assert_eq!(events_of(&frames).last(), Some(&"done".to_string()));
    }

    /// A forbidden tool call's `tool_result.error` must read exactly
    /// `"forbidden"`, not the message content's `"Error: "`-prefixed form.
    #[tokio::test]
    async fn forbidden_tool_result_strips_the_error_prefix() {
        let (graph_tx, graph_rx) = mpsc::channel(8);
        let (result_tx, result_rx) = oneshot::channel();
        let (frame_tx, mut frame_rx) = mpsc::channel(8);

        let conversation_store: Arc<dyn ConversationStore> = Arc::new(MockConversationStore::new());
        let handle = tokio::spawn(translate_events(
            "sess-2".to_string(),
            graph_rx,
            result_rx,
            frame_tx,
            conversation_store,
        ));

        let mut state = AgentState::new("sess-2", "do it", "mock");
        state.messages.push(orchestra_core::message::Message::tool_result(
            "call_1",
            "private_tool",
            "Error: forbidden",
        ));
        state.status = AgentStatus::Done;
        state.final_response = Some("done".to_string());
        graph_tx.send(StreamEvent::Values(state.clone())).await.unwrap();
        drop(graph_tx);

        let _ = result_tx.send(Ok(state));

        let mut frames = Vec::new();
        while let Some(frame) = frame_rx.recv().await {
            frames.push(frame);
        }
        handle.await.unwrap();

        let tool_result = frames
            .iter()
            .find(|f| f["event"] == "tool_result")
            .map(|f| f["data"].as_str().unwrap())
            .expect("a tool_result frame");
        let parsed: serde_json::Value = serde_json::from_str(tool_result).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "forbidden");
    }

    /// A successfully completed turn is appended to the conversation store
    /// exactly once, with the final assistant content and the full thinking
    /// log observed along the way.
    #[tokio::test]
    async fn successful_turn_is_persisted_once() {
        let (graph_tx, graph_rx) = mpsc::channel(8);
        let (result_tx, result_rx) = oneshot::channel();
        let (frame_tx, mut frame_rx) = mpsc::channel(8);

        let store = Arc::new(MockConversationStore::new());
        let conversation_store: Arc<dyn ConversationStore> = store.clone();
        let handle = tokio::spawn(translate_events(
            "sess-3".to_string(),
            graph_rx,
            result_rx,
            frame_tx,
            conversation_store,
        ));
        drop(graph_tx);

        let mut state = AgentState::new("sess-3", "what is 2+2", "mock");
        state.status = AgentStatus::Done;
        state.final_response = Some("4".to_string());
        let _ = result_tx.send(Ok(state));

        while frame_rx.recv().await.is_some() {}
        handle.await.unwrap();

        let turns = store.turns_for("sess-3");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].assistant_message.content, "4");
        assert_eq!(turns[0].user_message.content, "what is 2+2");
        assert!(!turns[0].thinking_steps.is_empty(), "the think-0 in-progress step is always recorded");
    }

    /// A turn that ends in an agent error must NOT be persisted: only the
    /// partial state existed, and spec.md requires discarding it.
    #[tokio::test]
    async fn errored_turn_is_not_persisted() {
        let (graph_tx, graph_rx) = mpsc::channel(8);
        let (result_tx, result_rx) = oneshot::channel::<Result<AgentState, AgentError>>();
        let (frame_tx, mut frame_rx) = mpsc::channel(8);

        let store = Arc::new(MockConversationStore::new());
        let conversation_store: Arc<dyn ConversationStore> = store.clone();
        let handle = tokio::spawn(translate_events(
            "sess-4".to_string(),
            graph_rx,
            result_rx,
            frame_tx,
            conversation_store,
        ));
        drop(graph_tx);

        let _ = result_tx.send(Err(AgentError::Provider(orchestra_core::ProviderError::Timeout)));

        while frame_rx.recv().await.is_some() {}
        handle.await.unwrap();

        assert!(store.turns_for("sess-4").is_empty());
    }
}
