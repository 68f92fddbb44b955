//! Provider configuration, read once from the environment at startup.
//!
//! Absent credentials are a valid steady state: the corresponding pool
//! slot stays empty and downstream callers degrade to defaults. Nothing
//! here re-reads the environment after construction.

use serde::{Deserialize, Serialize};

/// Credentials and endpoint for one provider deployment family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
}

impl ProviderCredentials {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

/// Immutable settings snapshot injected into the provider pool.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default chat deployment family (general-purpose models).
    pub azure: ProviderCredentials,
    /// Dedicated code/structured-output deployment, when separate.
    pub codex: ProviderCredentials,
    /// Keys for reasoning deployments sharing the default endpoint.
    pub o3_api_key: Option<String>,
    pub o1_api_key: Option<String>,
    pub o4_mini_api_key: Option<String>,
    /// Embeddings deployment name on the default endpoint.
    pub embedding_deployment: String,
}

impl Settings {
    /// Snapshot the environment. Never fails; anything missing leaves
    /// the corresponding provider unconfigured.
    pub fn from_env() -> Self {
        Self {
            azure: ProviderCredentials {
                endpoint: env_opt("AZURE_OPENAI_ENDPOINT"),
                api_key: env_opt("AZURE_OPENAI_API_KEY"),
                api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|_| "2025-01-01-preview".to_string()),
            },
            codex: ProviderCredentials {
                endpoint: env_opt("AZURE_OPENAI_CODEX_ENDPOINT"),
                api_key: env_opt("AZURE_OPENAI_CODEX_API_KEY"),
                api_version: std::env::var("AZURE_OPENAI_CODEX_API_VERSION")
                    .unwrap_or_else(|_| "2025-04-01-preview".to_string()),
            },
            o3_api_key: env_opt("O3_API_KEY"),
            o1_api_key: env_opt("O1_API_KEY"),
            o4_mini_api_key: env_opt("O4_MINI_API_KEY"),
            embedding_deployment: std::env::var("AZURE_OPENAI_DEPLOYMENT_EMBEDDING")
                .unwrap_or_else(|_| "text-embedding-ada-002".to_string()),
        }
    }

    /// Settings with no provider configured. Every call path then runs
    /// on deterministic fallbacks; used by tests and offline runs.
    pub fn disconnected() -> Self {
        Self {
            azure: ProviderCredentials {
                endpoint: None,
                api_key: None,
                api_version: "2025-01-01-preview".to_string(),
            },
            codex: ProviderCredentials {
                endpoint: None,
                api_key: None,
                api_version: "2025-04-01-preview".to_string(),
            },
            o3_api_key: None,
            o1_api_key: None,
            o4_mini_api_key: None,
            embedding_deployment: "text-embedding-ada-002".to_string(),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
