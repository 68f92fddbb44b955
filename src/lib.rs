//! idea-pipeline - Innovation Decision Support
//!
//! Evaluates free-text innovation proposals with a fixed panel of nine
//! analysis agents, matches them against already-deployed solutions,
//! and synthesizes a single go/no-go recommendation from the partial
//! results.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use idea_pipeline::{config::Settings, executor::CallExecutor};
//! use idea_pipeline::{embedding::Embedder, index::SimilarityIndex};
//! use idea_pipeline::orchestrator::AnalysisEngine;
//! use idea_pipeline::provider::ProviderPool;
//! use idea_pipeline::router::ModelRegistry;
//! use idea_pipeline::{seed, store};
//! use std::sync::Arc;
//!
//! let conn = store::init_db(&db_path)?;
//! seed::seed_if_empty(&conn)?;
//!
//! let pool = Arc::new(ProviderPool::from_settings(&Settings::from_env()));
//! let executor = CallExecutor::new(Arc::new(ModelRegistry::from_env()), pool.clone());
//! let embedder = Embedder::new(pool.embedding_client().cloned());
//!
//! let engine = AnalysisEngine::new(conn, executor, embedder, index);
//! let report = engine.run_all("idea-001").await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                     Caller                          │
//! └──────────────────────┬─────────────────────────────┘
//!                        ▼
//! ┌────────────────────────────────────────────────────┐
//! │  AnalysisEngine.run_all()                           │
//! │  nine guarded agents → overall recommendation       │
//! └───────┬──────────────┬──────────────┬──────────────┘
//!         ▼              ▼              ▼
//!   CallExecutor   SimilarityIndex   Rubric Scorer
//!   (router +      (embeddings +    (six weighted
//!    provider       tier/cost        dimensions →
//!    pool)          classifier)      quadrant)
//! ```

pub mod agents;
pub mod config;
pub mod embedding;
pub mod executor;
pub mod index;
pub mod matcher;
pub mod orchestrator;
pub mod provider;
pub mod router;
pub mod rubric;
pub mod seed;
pub mod store;
pub mod types;

// Core engine
pub use orchestrator::{AnalysisEngine, AnalysisReport};

// Routing and calls
pub use executor::{CallExecutor, ParsedOrDefault, StructuredCallResult};
pub use router::{ModelRegistry, ReasoningProfile, TaskType, DEFAULT_PROFILE};

// Providers and embeddings
pub use config::Settings;
pub use embedding::{fallback_vector, Embedder, EMBEDDING_DIM};
pub use provider::ProviderPool;

// Matching
pub use index::{similarity_from_distance, SimilarityIndex};
pub use matcher::{classify, fallback_matches, MatchReport, ReuseRecommendation};

// Scoring
pub use rubric::{calculate_quadrant, RubricSummary, DIMENSIONS};

// Data
pub use store::{init_db, IdeaFilter};
pub use types::*;
