//! Structured-call executor.
//!
//! Issues one request via the routed profile with exactly one fallback
//! attempt against the default profile, then extracts a structured
//! payload from the free-text reply. Provider failures and unparseable
//! output are both absorbed here: callers always get a result, flagged
//! and defaulted as needed, never an escaping error.

use crate::provider::ProviderPool;
use crate::router::{ModelRegistry, TaskType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Outcome of one structured call. Per-call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredCallResult {
    pub raw_text: String,
    pub model_used: String,
    pub deployment: String,
    pub task_type: TaskType,
    /// True only when no provider anywhere could serve the call.
    pub failed: bool,
}

/// A value recovered from model output, tagged with whether it is the
/// genuine parse or the documented default substituted for it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOrDefault<T> {
    Parsed(T),
    Defaulted(T),
}

impl<T> ParsedOrDefault<T> {
    pub fn value(&self) -> &T {
        match self {
            ParsedOrDefault::Parsed(v) | ParsedOrDefault::Defaulted(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ParsedOrDefault::Parsed(v) | ParsedOrDefault::Defaulted(v) => v,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ParsedOrDefault::Defaulted(_))
    }
}

impl StructuredCallResult {
    /// A flagged result for calls no provider could serve.
    pub fn unavailable(task_type: TaskType, reason: &str) -> Self {
        Self {
            raw_text: format!("No AI provider available: {}", reason),
            model_used: "none".to_string(),
            deployment: String::new(),
            task_type,
            failed: true,
        }
    }

    /// Extract the first top-level brace-delimited span of the raw text
    /// and deserialize it. Any miss (failed call, no span, bad JSON)
    /// substitutes the supplied default; fields are never absent.
    pub fn parse_json<T: DeserializeOwned>(&self, default: T) -> ParsedOrDefault<T> {
        if self.failed {
            return ParsedOrDefault::Defaulted(default);
        }
        match json_span(&self.raw_text).and_then(|span| serde_json::from_str::<T>(span).ok()) {
            Some(v) => ParsedOrDefault::Parsed(v),
            None => {
                warn!(task = %self.task_type, "structured payload missing or malformed, using defaults");
                ParsedOrDefault::Defaulted(default)
            }
        }
    }
}

/// Locate the first top-level `{...}` span, tracking string literals so
/// braces inside quoted text don't end the span early.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Routes, calls, retries once, and wraps the reply.
#[derive(Clone)]
pub struct CallExecutor {
    registry: Arc<ModelRegistry>,
    pool: Arc<ProviderPool>,
}

impl CallExecutor {
    pub fn new(registry: Arc<ModelRegistry>, pool: Arc<ProviderPool>) -> Self {
        Self { registry, pool }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// One structured call. Never returns an error:
    /// - no client anywhere -> flagged `failed` result;
    /// - provider failure -> exactly one retry on the default profile;
    /// - second failure -> flagged `failed` result.
    pub async fn call(
        &self,
        task_type: TaskType,
        prompt: &str,
        system_message: Option<&str>,
    ) -> StructuredCallResult {
        let profile = self.registry.route(task_type);

        let Some(client) = self.pool.client_for(&profile.name) else {
            return StructuredCallResult::unavailable(task_type, "no client configured");
        };

        match client
            .chat(
                &profile.deployment,
                system_message,
                prompt,
                task_type.temperature(),
                task_type.max_tokens(),
            )
            .await
        {
            Ok(text) => StructuredCallResult {
                raw_text: text,
                model_used: profile.name.clone(),
                deployment: profile.deployment.clone(),
                task_type,
                failed: false,
            },
            Err(e) => {
                warn!(profile = %profile.name, error = %e, "provider call failed, retrying on default profile");
                self.retry_on_default(task_type, prompt, system_message).await
            }
        }
    }

    /// The single bounded fallback attempt. No backoff, no further retries.
    async fn retry_on_default(
        &self,
        task_type: TaskType,
        prompt: &str,
        system_message: Option<&str>,
    ) -> StructuredCallResult {
        let fallback = self.registry.default_profile();
        let Some(client) = self.pool.default_client() else {
            return StructuredCallResult::unavailable(task_type, "default client not configured");
        };

        match client
            .chat(
                &fallback.deployment,
                system_message,
                prompt,
                task_type.temperature(),
                task_type.max_tokens(),
            )
            .await
        {
            Ok(text) => StructuredCallResult {
                raw_text: text,
                model_used: format!("{} (fallback)", fallback.name),
                deployment: fallback.deployment.clone(),
                task_type,
                failed: false,
            },
            Err(e) => {
                warn!(error = %e, "fallback provider call failed");
                StructuredCallResult::unavailable(task_type, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        score: i64,
        #[serde(default)]
        note: String,
    }

    fn result_with(text: &str) -> StructuredCallResult {
        StructuredCallResult {
            raw_text: text.to_string(),
            model_used: "gpt-4.1".to_string(),
            deployment: "gpt-4.1".to_string(),
            task_type: TaskType::Feasibility,
            failed: false,
        }
    }

    #[test]
    fn test_json_span_plain() {
        assert_eq!(json_span(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_json_span_embedded_in_prose() {
        let text = "Here is the analysis:\n{\"score\": 7, \"note\": \"ok\"}\nHope that helps!";
        assert_eq!(json_span(text), Some("{\"score\": 7, \"note\": \"ok\"}"));
    }

    #[test]
    fn test_json_span_ignores_braces_in_strings() {
        let text = r#"{"note": "use {curly} braces", "score": 2}"#;
        assert_eq!(json_span(text), Some(text));
    }

    #[test]
    fn test_json_span_nested() {
        let text = r#"prefix {"outer": {"inner": 1}} trailing {"second": 2}"#;
        assert_eq!(json_span(text), Some(r#"{"outer": {"inner": 1}}"#));
    }

    #[test]
    fn test_parse_json_success() {
        let result = result_with("Sure! {\"score\": 9, \"note\": \"solid\"} Done.");
        let parsed = result.parse_json(Probe { score: 0, note: String::new() });
        assert!(!parsed.is_default());
        assert_eq!(parsed.value().score, 9);
    }

    #[test]
    fn test_parse_json_unparseable_substitutes_default() {
        let result = result_with("I could not produce JSON this time, sorry.");
        let parsed = result.parse_json(Probe { score: 5, note: "default".into() });
        assert!(parsed.is_default());
        assert_eq!(parsed.value().score, 5);
        assert_eq!(parsed.value().note, "default");
    }

    #[test]
    fn test_parse_json_failed_call_substitutes_default() {
        let result = StructuredCallResult::unavailable(TaskType::Coaching, "no client configured");
        assert!(result.failed);
        let parsed = result.parse_json(Probe { score: 3, note: String::new() });
        assert!(parsed.is_default());
    }

    #[tokio::test]
    async fn test_call_without_any_client_never_panics() {
        let executor = CallExecutor::new(
            Arc::new(ModelRegistry::from_env()),
            Arc::new(ProviderPool::disconnected()),
        );
        let result = executor.call(TaskType::Feasibility, "score this", None).await;
        assert!(result.failed);
        assert_eq!(result.model_used, "none");
    }
}
