//! Task routing across reasoning-engine profiles.
//!
//! Each profile names an external model deployment and the task
//! categories it was picked for. Routing is total: any task type,
//! including ones added later and never mapped, resolves to the default
//! general-purpose profile.

use serde::{Deserialize, Serialize};

/// Semantic task categories the pipeline issues calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SystemContext,
    SolutionArchitecture,
    Feasibility,
    Similarity,
    StrategicFit,
    ResourceOptimization,
    BrdGeneration,
    Coaching,
    Notifications,
    RunAllAnalysis,
    Classification,
    EntityExtraction,
    Summarization,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::SystemContext => "system_context",
            TaskType::SolutionArchitecture => "solution_architecture",
            TaskType::Feasibility => "feasibility",
            TaskType::Similarity => "similarity",
            TaskType::StrategicFit => "strategic_fit",
            TaskType::ResourceOptimization => "resource_optimization",
            TaskType::BrdGeneration => "brd_generation",
            TaskType::Coaching => "coaching",
            TaskType::Notifications => "notifications",
            TaskType::RunAllAnalysis => "run_all_analysis",
            TaskType::Classification => "classification",
            TaskType::EntityExtraction => "entity_extraction",
            TaskType::Summarization => "summarization",
        }
    }

    /// Low temperature for tasks expected to emit structured artifacts.
    pub fn temperature(&self) -> f32 {
        match self {
            TaskType::SolutionArchitecture
            | TaskType::BrdGeneration
            | TaskType::Feasibility => 0.3,
            _ => 0.7,
        }
    }

    /// Document and architecture generation get more room.
    pub fn max_tokens(&self) -> u32 {
        match self {
            TaskType::SolutionArchitecture | TaskType::BrdGeneration => 4000,
            _ => 2000,
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named binding from task categories to a model deployment.
///
/// Pure metadata: nothing here talks to the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningProfile {
    pub name: String,
    pub deployment: String,
    pub use_case: String,
    pub tasks: Vec<TaskType>,
}

/// Name of the profile every unmapped task falls back to.
pub const DEFAULT_PROFILE: &str = "gpt-4.1";

/// Immutable profile registry constructed once at startup.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    profiles: Vec<ReasoningProfile>,
}

impl ModelRegistry {
    /// Build the registry, letting the environment override deployment
    /// names per profile.
    pub fn from_env() -> Self {
        let profile = |name: &str, env_key: &str, fallback: &str, use_case: &str, tasks: Vec<TaskType>| {
            ReasoningProfile {
                name: name.to_string(),
                deployment: std::env::var(env_key).unwrap_or_else(|_| fallback.to_string()),
                use_case: use_case.to_string(),
                tasks,
            }
        };

        Self {
            profiles: vec![
                profile(
                    "o3",
                    "AZURE_OPENAI_DEPLOYMENT_O3",
                    "o3",
                    "Advanced reasoning, strategic decisions",
                    vec![
                        TaskType::StrategicFit,
                        TaskType::ResourceOptimization,
                        TaskType::RunAllAnalysis,
                    ],
                ),
                profile(
                    "o1",
                    "AZURE_OPENAI_DEPLOYMENT_O1",
                    "o1",
                    "Deep reasoning, risk and financial analysis",
                    vec![TaskType::Feasibility],
                ),
                profile(
                    "gpt-4.1",
                    "AZURE_OPENAI_DEPLOYMENT_GPT41",
                    "gpt-4.1",
                    "General purpose, conversational coaching",
                    vec![TaskType::Coaching],
                ),
                profile(
                    "gpt-4.1-mini",
                    "AZURE_OPENAI_DEPLOYMENT_GPT41_MINI",
                    "gpt-4.1-mini",
                    "Fast general-purpose tasks",
                    vec![TaskType::Similarity, TaskType::Notifications],
                ),
                profile(
                    "gpt-4.1-nano",
                    "AZURE_OPENAI_DEPLOYMENT_GPT41_NANO",
                    "gpt-4.1-nano",
                    "Ultra-fast extraction and tagging",
                    vec![
                        TaskType::SystemContext,
                        TaskType::Classification,
                        TaskType::EntityExtraction,
                    ],
                ),
                profile(
                    "gpt-5.1-codex",
                    "AZURE_OPENAI_CODEX_DEPLOYMENT",
                    "gpt-5.1-codex",
                    "Code generation, technical artifacts, structured JSON",
                    vec![TaskType::SolutionArchitecture, TaskType::BrdGeneration],
                ),
            ],
        }
    }

    /// Resolve a task type to its profile. Total: unmapped tasks get the
    /// default profile.
    pub fn route(&self, task_type: TaskType) -> &ReasoningProfile {
        self.profiles
            .iter()
            .find(|p| p.tasks.contains(&task_type))
            .unwrap_or_else(|| self.default_profile())
    }

    pub fn default_profile(&self) -> &ReasoningProfile {
        self.profiles
            .iter()
            .find(|p| p.name == DEFAULT_PROFILE)
            .expect("registry always contains the default profile")
    }

    pub fn profiles(&self) -> &[ReasoningProfile] {
        &self.profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_mapped_tasks() {
        let registry = ModelRegistry::from_env();
        assert_eq!(registry.route(TaskType::Feasibility).name, "o1");
        assert_eq!(registry.route(TaskType::StrategicFit).name, "o3");
        assert_eq!(registry.route(TaskType::BrdGeneration).name, "gpt-5.1-codex");
        assert_eq!(registry.route(TaskType::SystemContext).name, "gpt-4.1-nano");
    }

    #[test]
    fn test_unmapped_task_routes_to_default() {
        let registry = ModelRegistry::from_env();
        // Summarization has no dedicated profile entry.
        assert_eq!(registry.route(TaskType::Summarization).name, DEFAULT_PROFILE);
    }

    #[test]
    fn test_default_profile_present() {
        let registry = ModelRegistry::from_env();
        assert_eq!(registry.default_profile().name, DEFAULT_PROFILE);
    }

    #[test]
    fn test_temperature_and_token_budgets() {
        assert_eq!(TaskType::SolutionArchitecture.temperature(), 0.3);
        assert_eq!(TaskType::Coaching.temperature(), 0.7);
        assert_eq!(TaskType::BrdGeneration.max_tokens(), 4000);
        assert_eq!(TaskType::Notifications.max_tokens(), 2000);
    }
}
