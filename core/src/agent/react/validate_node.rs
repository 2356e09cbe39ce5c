//! Validate node: scans the tool results from the iteration just finished for
//! missing expected keys and sensitive data, masking hits in place. Always
//! advisory: the aggregate status never blocks progression back to `think`.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::AgentError;
use crate::graph::{Next, RunContext};
use crate::state::{AgentState, ValidationIssue, ValidationStatus};
use crate::Node;

/// 18-digit identity number with a trailing digit or checksum letter X.
static IDENTITY_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{17}[0-9Xx])\b").unwrap());
/// A run of 15 to 19 digits, as seen in credit card numbers.
static CREDIT_CARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{15,19})\b").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([\w.+-]+)@([\w-]+\.[\w.-]+)\b").unwrap());

/// Masks the middle of a digit run, keeping the first two and last two digits.
fn mask_digits(s: &str) -> String {
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    let head = &s[..2];
    let tail = &s[s.len() - 2..];
    format!("{head}{}{tail}", "*".repeat(s.len() - 4))
}

fn mask_email(local: &str, domain: &str) -> String {
    let masked_local = if local.len() <= 1 {
        "*".to_string()
    } else {
        format!("{}{}", &local[..1], "*".repeat(local.len() - 1))
    };
    format!("{masked_local}@{domain}")
}

/// Scans `text` for sensitive patterns, returning the sanitized text and any
/// issues found (kind `sensitive_data`).
fn scan_and_mask(text: &str) -> (String, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let mut out = text.to_string();

    if IDENTITY_NUMBER.is_match(&out) {
        issues.push(ValidationIssue { kind: "sensitive_data".into(), message: "identity number detected".into() });
        out = IDENTITY_NUMBER.replace_all(&out, |caps: &regex::Captures| mask_digits(&caps[1])).into_owned();
    }
    if CREDIT_CARD.is_match(&out) {
        issues.push(ValidationIssue { kind: "sensitive_data".into(), message: "credit card number detected".into() });
        out = CREDIT_CARD.replace_all(&out, |caps: &regex::Captures| mask_digits(&caps[1])).into_owned();
    }
    if EMAIL.is_match(&out) {
        issues.push(ValidationIssue { kind: "sensitive_data".into(), message: "email address detected".into() });
        out = EMAIL
            .replace_all(&out, |caps: &regex::Captures| mask_email(&caps[1], &caps[2]))
            .into_owned();
    }
    (out, issues)
}

fn scan_value(value: &Value, issues: &mut Vec<ValidationIssue>) -> Value {
    match value {
        Value::String(s) => {
            let (masked, mut found) = scan_and_mask(s);
            issues.append(&mut found);
            Value::String(masked)
        }
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), scan_value(v, issues))).collect()),
        Value::Array(items) => Value::Array(items.iter().map(|v| scan_value(v, issues)).collect()),
        other => other.clone(),
    }
}

/// Checks that `required` keys (if declared) are present at the object's top level.
fn shape_check(name: &str, value: &Value, required: &[String], issues: &mut Vec<ValidationIssue>) {
    let Value::Object(map) = value else { return };
    for key in required {
        if !map.contains_key(key) {
            issues.push(ValidationIssue {
                kind: "shape".into(),
                message: format!("tool '{name}' result missing expected key '{key}'"),
            });
        }
    }
}

fn required_keys(parameters: &Value) -> Vec<String> {
    parameters
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

pub struct ValidateNode {
    catalog: Arc<dyn Catalog>,
}

impl ValidateNode {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Node<AgentState> for ValidateNode {
    fn id(&self) -> &str {
        "validate"
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }

    async fn run_with_context(
        &self,
        mut state: AgentState,
        _ctx: &RunContext<AgentState>,
    ) -> Result<(AgentState, Next), AgentError> {
        let mut issues = Vec::new();

        for message in state.messages.iter_mut().rev() {
            if message.role != Some(crate::message::Role::Tool) {
                break;
            }
            let Ok(parsed) = serde_json::from_str::<Value>(&message.content) else {
                continue;
            };
            if let Some(name) = &message.name {
                if let Some(tool) = self.catalog.get_tool(name) {
                    shape_check(name, &parsed, &required_keys(&tool.definition.parameters), &mut issues);
                }
            }
            let sanitized = scan_value(&parsed, &mut issues);
            message.content = serde_json::to_string(&sanitized).unwrap_or_else(|_| message.content.clone());
        }

        state.validation_status = if issues.iter().any(|i| i.kind == "shape" || i.kind == "sensitive_data") {
            if issues.iter().any(|i| i.kind == "sensitive_data") {
                ValidationStatus::Failed
            } else {
                ValidationStatus::Warning
            }
        } else {
            ValidationStatus::Passed
        };
        state.validation_issues = issues;
        // A tool_call/tool_result pair just completed; count it here (not in
        // `think`) so `validate_route`/`think_route` see the same iteration
        // count and a cap of N lets exactly N pairs run.
        state.iteration += 1;

        Ok((state, Next::Continue))
    }
}
