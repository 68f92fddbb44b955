//! Multi-agent analysis orchestrator.
//!
//! Runs the nine agents in a fixed order, isolates every agent failure
//! behind a uniform guard, and folds the partial results into one
//! overall recommendation. The only error that escapes `run_all` is an
//! unknown idea id; everything else degrades per agent.

use crate::agents;
use crate::embedding::Embedder;
use crate::executor::CallExecutor;
use crate::index::SimilarityIndex;
use crate::store;
use crate::types::{AgentRunResult, Decision, OverallRecommendation};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{info, warn};

/// Aggregate output of one `run_all` invocation.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub idea_id: String,
    pub agents: Vec<AgentRunResult>,
    /// Either a serialized recommendation or an error-tagged object.
    pub overall_recommendation: Value,
    pub models_used: Vec<String>,
}

impl AnalysisReport {
    /// Agent payloads keyed by agent name, failures error-tagged.
    pub fn agent_payloads(&self) -> serde_json::Map<String, Value> {
        self.agents
            .iter()
            .map(|r| (r.agent.to_string(), r.report_payload()))
            .collect()
    }
}

/// Run one agent future under the isolation guard: a failure becomes a
/// recorded result, never a propagated error.
async fn guarded<F>(agent: &'static str, fut: F) -> AgentRunResult
where
    F: Future<Output = Result<Value>>,
{
    match fut.await {
        Ok(payload) => AgentRunResult { agent, payload, error: None },
        Err(e) => {
            warn!(agent, error = %e, "agent failed, continuing with siblings");
            AgentRunResult {
                agent,
                payload: Value::Null,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Synthesize the final decision from feasibility's approval
/// probability and strategic fit's quadrant. Missing or failed inputs
/// fall back to a neutral probability and an unfavorable quadrant.
fn derive_overall(results: &[AgentRunResult]) -> Result<OverallRecommendation> {
    let payload_of = |name: &str| {
        results
            .iter()
            .find(|r| r.agent == name && r.succeeded())
            .map(|r| &r.payload)
    };

    let approval_probability = payload_of("feasibility")
        .and_then(|p| p["approval_probability"].as_f64())
        .unwrap_or(0.5);
    let feasibility_score = payload_of("feasibility")
        .and_then(|p| p["overall_score"].as_f64())
        .unwrap_or(5.0);
    let quadrant = payload_of("strategic_fit")
        .and_then(|p| p["quadrant"].as_str())
        .unwrap_or("Low Priority")
        .to_string();

    let favorable = quadrant == "Quick Wins" || quadrant == "Big Bets";
    let decision = if approval_probability >= 0.8 && favorable {
        Decision::Approve
    } else if approval_probability >= 0.6 && favorable {
        Decision::ConditionalApprove
    } else if approval_probability >= 0.5 {
        Decision::Defer
    } else {
        Decision::Reject
    };

    let reasoning = format!(
        "Approval probability {:.2} with strategic quadrant '{}'",
        approval_probability, quadrant
    );

    Ok(OverallRecommendation {
        decision,
        reasoning,
        feasibility_score,
        strategic_quadrant: quadrant,
        approval_probability,
    })
}

/// Owns everything one analysis run needs.
pub struct AnalysisEngine {
    conn: Connection,
    executor: CallExecutor,
    embedder: Embedder,
    index: SimilarityIndex,
}

impl AnalysisEngine {
    pub fn new(
        conn: Connection,
        executor: CallExecutor,
        embedder: Embedder,
        index: SimilarityIndex,
    ) -> Self {
        Self { conn, executor, embedder, index }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    /// Full nine-agent analysis of one idea. Errors only when the idea
    /// id is unknown.
    pub async fn run_all(&self, idea_id: &str) -> Result<AnalysisReport> {
        let idea = store::get_idea(&self.conn, idea_id)?;
        info!(idea_id, title = %idea.title, "starting full analysis");

        let mut results = Vec::with_capacity(9);
        results.push(guarded("system_context", agents::system_context(&self.executor, &idea)).await);
        results.push(guarded("feasibility", agents::feasibility(&self.executor, &idea)).await);
        results.push(
            guarded(
                "strategic_fit",
                agents::strategic_fit(&self.conn, &self.executor, &idea),
            )
            .await,
        );
        results.push(
            guarded("resource_optimizer", agents::resource_optimizer(&self.executor, &idea)).await,
        );
        results.push(guarded("brd_generator", agents::brd_generator(&self.executor, &idea)).await);
        results.push(guarded("ai_coach", agents::ai_coach(&self.executor, &idea)).await);
        results.push(
            guarded(
                "solution_architecture",
                agents::solution_architecture(&self.executor, &idea),
            )
            .await,
        );
        results.push(
            guarded(
                "similarity_matcher",
                agents::similarity_matcher(&self.embedder, &self.index, &idea),
            )
            .await,
        );
        results.push(
            guarded(
                "notification_intelligence",
                agents::notification_intelligence(&self.executor, &idea),
            )
            .await,
        );

        // Aggregation runs under the same guard as the agents.
        let overall_recommendation = match derive_overall(&results) {
            Ok(rec) => serde_json::to_value(&rec)?,
            Err(e) => {
                warn!(error = %e, "overall recommendation failed");
                serde_json::json!({ "error": e.to_string() })
            }
        };

        let mut models_used: Vec<String> = results
            .iter()
            .filter_map(|r| r.payload["model_used"].as_str().map(|s| s.to_string()))
            .collect();
        models_used.sort();
        models_used.dedup();

        let failed = results.iter().filter(|r| !r.succeeded()).count();
        info!(idea_id, failed_agents = failed, "analysis complete");

        Ok(AnalysisReport {
            idea_id: idea_id.to_string(),
            agents: results,
            overall_recommendation,
            models_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderPool;
    use crate::router::ModelRegistry;
    use crate::types::{Idea, IdeaDraft};
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::Arc;

    fn offline_engine() -> AnalysisEngine {
        AnalysisEngine::new(
            store::init_memory_db().unwrap(),
            CallExecutor::new(
                Arc::new(ModelRegistry::from_env()),
                Arc::new(ProviderPool::disconnected()),
            ),
            Embedder::offline(),
            SimilarityIndex::new(),
        )
    }

    fn sample_idea() -> Idea {
        Idea::from_draft(IdeaDraft {
            title: "Quiet hours paging".to_string(),
            problem_statement: "Overhead pages wake patients at night".to_string(),
            proposed_solution: "Route non-urgent pages to staff phones after 21:00".to_string(),
            expected_benefit: "Better patient sleep scores".to_string(),
            submitter_name: Some("J. Park".to_string()),
            category: Some("patient-experience".to_string()),
            hospital: None,
        })
    }

    fn result(agent: &'static str, payload: Value) -> AgentRunResult {
        AgentRunResult { agent, payload, error: None }
    }

    #[tokio::test]
    async fn test_run_all_offline_completes_all_nine() {
        let engine = offline_engine();
        let idea = sample_idea();
        store::insert_idea(engine.conn(), &idea).unwrap();

        let report = engine.run_all(&idea.id).await.unwrap();
        assert_eq!(report.agents.len(), 9);
        assert!(report.agents.iter().all(|r| r.succeeded()));
        // Offline: feasibility defaults to 0.85, quadrant to Low Priority.
        assert_eq!(report.overall_recommendation["decision"], "DEFER");
        assert_eq!(report.overall_recommendation["strategic_quadrant"], "Low Priority");
    }

    #[tokio::test]
    async fn test_run_all_unknown_idea_errors() {
        let engine = offline_engine();
        let err = engine.run_all("missing").await.unwrap_err();
        assert!(err.to_string().contains("Idea not found"));
    }

    #[tokio::test]
    async fn test_guard_isolates_failures() {
        let failing = guarded("feasibility", async { Err(anyhow!("provider melted down")) }).await;
        assert!(!failing.succeeded());
        assert_eq!(failing.report_payload()["error"], "provider melted down");

        let fine = guarded("ai_coach", async { Ok(json!({"ok": true})) }).await;
        assert!(fine.succeeded());
    }

    #[test]
    fn test_overall_with_failed_feasibility_uses_defaults() {
        let results = vec![
            AgentRunResult {
                agent: "feasibility",
                payload: Value::Null,
                error: Some("boom".to_string()),
            },
            result("strategic_fit", json!({"quadrant": "Quick Wins"})),
        ];
        let rec = derive_overall(&results).unwrap();
        assert_eq!(rec.approval_probability, 0.5);
        // 0.5 with a favorable quadrant still only defers.
        assert_eq!(rec.decision, Decision::Defer);
    }

    #[test]
    fn test_overall_decision_thresholds() {
        let mk = |prob: f64, quadrant: &str| {
            derive_overall(&[
                result("feasibility", json!({"approval_probability": prob, "overall_score": 8.0})),
                result("strategic_fit", json!({"quadrant": quadrant})),
            ])
            .unwrap()
            .decision
        };
        assert_eq!(mk(0.85, "Quick Wins"), Decision::Approve);
        assert_eq!(mk(0.85, "Big Bets"), Decision::Approve);
        assert_eq!(mk(0.65, "Quick Wins"), Decision::ConditionalApprove);
        assert_eq!(mk(0.85, "Low Priority"), Decision::Defer);
        assert_eq!(mk(0.55, "Parking Lot"), Decision::Defer);
        assert_eq!(mk(0.4, "Quick Wins"), Decision::Reject);
    }

    #[test]
    fn test_agent_payloads_tags_errors() {
        let report = AnalysisReport {
            idea_id: "i".to_string(),
            agents: vec![
                result("ai_coach", json!({"phase": "define"})),
                AgentRunResult {
                    agent: "feasibility",
                    payload: Value::Null,
                    error: Some("down".to_string()),
                },
            ],
            overall_recommendation: Value::Null,
            models_used: vec![],
        };
        let payloads = report.agent_payloads();
        assert_eq!(payloads["ai_coach"]["phase"], "define");
        assert_eq!(payloads["feasibility"]["error"], "down");
    }
}
