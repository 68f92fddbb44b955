//! Provider client pool.
//!
//! One handle per external deployment family, initialized once at
//! startup. A slot left `None` (missing credentials, bad endpoint) is a
//! valid steady state handled downstream, not an error: the executor
//! returns flagged results and the embedder falls back to deterministic
//! vectors.

use crate::config::{ProviderCredentials, Settings};
use anyhow::{anyhow, Result};
use tracing::{info, warn};

/// Chat-completions client for one Azure-OpenAI-style endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl ChatClient {
    fn new(creds: &ProviderCredentials, api_key_override: Option<&str>) -> Option<Self> {
        let endpoint = creds.endpoint.clone()?;
        let api_key = api_key_override
            .map(|k| k.to_string())
            .or_else(|| creds.api_key.clone())?;
        Some(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: creds.api_version.clone(),
        })
    }

    /// One chat-completions round trip. Returns the assistant text.
    pub async fn chat(
        &self,
        deployment: &str,
        system_message: Option<&str>,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_message {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, deployment, self.api_version
        );

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "messages": messages,
                "temperature": temperature,
                "max_tokens": max_tokens,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("provider returned {}: {}", status, body));
        }

        let json: serde_json::Value = response.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("provider response had no message content"))
    }
}

/// Embeddings client on the default endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
}

impl EmbeddingClient {
    fn new(creds: &ProviderCredentials, deployment: &str) -> Option<Self> {
        let endpoint = creds.endpoint.clone()?;
        let api_key = creds.api_key.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: creds.api_version.clone(),
            deployment: deployment.to_string(),
        })
    }

    /// Embed one text. The caller handles failure by substituting the
    /// deterministic fallback vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({ "input": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("embeddings endpoint returned {}", status));
        }

        let json: serde_json::Value = response.json().await?;
        let values = json["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow!("embeddings response had no vector"))?;
        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }
}

/// All provider handles for the process lifetime.
///
/// Shared read-only after startup; cheap to clone handles out of.
#[derive(Debug, Default)]
pub struct ProviderPool {
    default_chat: Option<ChatClient>,
    codex: Option<ChatClient>,
    o3: Option<ChatClient>,
    o1: Option<ChatClient>,
    o4_mini: Option<ChatClient>,
    embeddings: Option<EmbeddingClient>,
}

impl ProviderPool {
    /// Initialize every slot. Failures are logged and leave `None`;
    /// startup always succeeds.
    pub fn from_settings(settings: &Settings) -> Self {
        let default_chat = ChatClient::new(&settings.azure, None);
        match &default_chat {
            Some(_) => info!("default chat provider initialized"),
            None => warn!("default chat provider not configured"),
        }

        let codex = ChatClient::new(&settings.codex, None);
        if codex.is_none() {
            warn!("codex provider not configured, structured tasks use the default profile");
        }

        // Reasoning deployments share the default endpoint with their own keys.
        let o3 = ChatClient::new(&settings.azure, settings.o3_api_key.as_deref());
        let o1 = ChatClient::new(&settings.azure, settings.o1_api_key.as_deref());
        let o4_mini = ChatClient::new(&settings.azure, settings.o4_mini_api_key.as_deref());

        let embeddings = EmbeddingClient::new(&settings.azure, &settings.embedding_deployment);
        if embeddings.is_none() {
            warn!("embeddings provider not configured, using deterministic fallback vectors");
        }

        Self {
            default_chat,
            codex,
            o3,
            o1,
            o4_mini,
            embeddings,
        }
    }

    /// Pool with every slot empty.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Client for a profile name. Profiles without a dedicated slot, and
    /// profiles whose slot failed to initialize, resolve to the default
    /// chat client (which may itself be `None`).
    pub fn client_for(&self, profile_name: &str) -> Option<&ChatClient> {
        let dedicated = match profile_name {
            "gpt-5.1-codex" => self.codex.as_ref(),
            "o3" => self.o3.as_ref(),
            "o1" => self.o1.as_ref(),
            "o4-mini" => self.o4_mini.as_ref(),
            _ => None,
        };
        dedicated.or(self.default_chat.as_ref())
    }

    pub fn default_client(&self) -> Option<&ChatClient> {
        self.default_chat.as_ref()
    }

    pub fn embedding_client(&self) -> Option<&EmbeddingClient> {
        self.embeddings.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_pool_yields_no_clients() {
        let pool = ProviderPool::disconnected();
        assert!(pool.client_for("gpt-4.1").is_none());
        assert!(pool.client_for("gpt-5.1-codex").is_none());
        assert!(pool.default_client().is_none());
        assert!(pool.embedding_client().is_none());
    }

    #[test]
    fn test_missing_credentials_leave_slots_empty() {
        let pool = ProviderPool::from_settings(&Settings::disconnected());
        assert!(pool.default_client().is_none());
        assert!(pool.embedding_client().is_none());
    }
}
