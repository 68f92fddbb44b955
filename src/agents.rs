//! The nine analysis agents.
//!
//! Each agent is an independent async step over one idea. Agents absorb
//! provider and parse failures internally via the executor's defaults;
//! an error returned here is genuinely unexpected and gets isolated by
//! the orchestrator's guard rather than aborting the run.

use crate::embedding::Embedder;
use crate::executor::CallExecutor;
use crate::index::SimilarityIndex;
use crate::matcher;
use crate::router::TaskType;
use crate::rubric;
use crate::types::Idea;
use anyhow::Result;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};

/// Known hospital platforms and the keywords that reveal them.
const KNOWN_SYSTEMS: &[(&str, &[&str])] = &[
    ("Epic", &["epic", "mychart", "mar"]),
    ("Pyxis", &["pyxis", "medication"]),
    ("Azure", &["azure", "microsoft"]),
    ("Power Platform", &["power apps", "power bi"]),
];

/// Detect which platforms an idea touches and estimate integration
/// complexity from the count. Keyword scan first, model commentary on top.
pub async fn system_context(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let text = idea.search_text().to_lowercase();
    let detected: Vec<&str> = KNOWN_SYSTEMS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(name, _)| *name)
        .collect();

    let complexity = (3.0 + 1.5 * detected.len() as f64).min(10.0);

    let prompt = format!(
        "An innovation idea may touch these hospital systems: {:?}.\n\
         Idea: {}\nProblem: {}\n\n\
         Respond with JSON: {{\"integration_notes\": \"<two sentences on integration considerations>\"}}",
        detected, idea.title, idea.problem_statement
    );
    let result = executor.call(TaskType::SystemContext, &prompt, None).await;

    #[derive(Deserialize)]
    struct Notes {
        integration_notes: String,
    }
    let notes = result
        .parse_json(Notes {
            integration_notes: "Standard integration review required before pilot.".to_string(),
        })
        .into_value();

    Ok(json!({
        "detected_systems": detected,
        "integration_complexity": complexity,
        "integration_notes": notes.integration_notes,
        "model_used": result.model_used,
    }))
}

/// Fixed feasibility lenses and the confidence we place in each.
const FEASIBILITY_DIMENSIONS: &[(&str, f64)] = &[
    ("technical", 0.85),
    ("financial", 0.90),
    ("strategic", 0.95),
    ("organizational", 0.75),
    ("timeline", 0.80),
];

fn feasibility_recommendation(overall: f64) -> &'static str {
    if overall >= 8.5 {
        "approve"
    } else if overall >= 7.0 {
        "conditional-approve"
    } else {
        "defer"
    }
}

/// Five-lens feasibility assessment. Scores come from the routed model;
/// any lens it fails to rate lands at a neutral 7.
pub async fn feasibility(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let lenses: Vec<&str> = FEASIBILITY_DIMENSIONS.iter().map(|(n, _)| *n).collect();
    let prompt = format!(
        "Assess the feasibility of this idea on five lenses, each 1-10: {}.\n\
         Title: {}\nProblem: {}\nSolution: {}\n\n\
         Respond with JSON only: {{\"technical\": <n>, \"financial\": <n>, \"strategic\": <n>, \
         \"organizational\": <n>, \"timeline\": <n>}}",
        lenses.join(", "),
        idea.title,
        idea.problem_statement,
        idea.proposed_solution,
    );
    let result = executor
        .call(
            TaskType::Feasibility,
            &prompt,
            Some("You are a hospital operations feasibility analyst. Respond with strict JSON."),
        )
        .await;

    let ratings = result
        .parse_json::<serde_json::Map<String, Value>>(serde_json::Map::new())
        .into_value();

    let mut dimensions = Vec::new();
    let mut total = 0.0;
    for (name, confidence) in FEASIBILITY_DIMENSIONS {
        let score = ratings
            .get(*name)
            .and_then(Value::as_f64)
            .map(|s| s.clamp(1.0, 10.0))
            .unwrap_or(7.0);
        total += score;
        dimensions.push(json!({
            "dimension": name,
            "score": score,
            "confidence": confidence,
        }));
    }
    let overall = total / FEASIBILITY_DIMENSIONS.len() as f64;
    let approval_probability = (0.5 + overall * 0.05).min(0.99);

    Ok(json!({
        "dimensions": dimensions,
        "overall_score": overall,
        "approval_probability": approval_probability,
        "recommendation": feasibility_recommendation(overall),
        "model_used": result.model_used,
    }))
}

/// Rubric-based strategic placement: rates the six dimensions via the
/// routed model, persists them, and reports the quadrant.
pub async fn strategic_fit(
    conn: &Connection,
    executor: &CallExecutor,
    idea: &Idea,
) -> Result<Value> {
    let summary = rubric::ai_recommend(conn, executor, idea).await?;
    // A reviewer's explicit placement outranks the derived quadrant.
    let quadrant = idea
        .quadrant
        .clone()
        .unwrap_or_else(|| summary.quadrant.label().to_string());
    Ok(json!({
        "value_score": summary.value_score,
        "effort_score": summary.effort_score,
        "quadrant": quadrant,
        "scores": summary.scores,
        "model_used": executor.registry().route(TaskType::StrategicFit).name,
    }))
}

/// Staffing and resourcing plan from the routed model, with a
/// conservative default plan when the call yields nothing usable.
pub async fn resource_optimizer(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let prompt = format!(
        "Plan the team needed to pilot this idea.\n\
         Title: {}\nSolution: {}\n\n\
         Respond with JSON only: {{\"required_roles\": [\"<role>\"], \"estimated_fte\": <number>, \
         \"shared_resources\": [\"<existing team or asset to reuse>\"], \
         \"budget_allocation\": {{\"build\": <fraction>, \"change_management\": <fraction>, \
         \"contingency\": <fraction>}}}}",
        idea.title, idea.proposed_solution
    );
    let result = executor.call(TaskType::ResourceOptimization, &prompt, None).await;

    #[derive(Deserialize)]
    struct Plan {
        required_roles: Vec<String>,
        estimated_fte: f64,
        shared_resources: Vec<String>,
        budget_allocation: Value,
    }
    let plan = result
        .parse_json(Plan {
            required_roles: vec![
                "Project lead".to_string(),
                "Clinical champion".to_string(),
                "IT analyst".to_string(),
            ],
            estimated_fte: 2.5,
            shared_resources: vec!["Innovation lab".to_string()],
            budget_allocation: json!({
                "build": 0.5,
                "change_management": 0.3,
                "contingency": 0.2,
            }),
        })
        .into_value();

    Ok(json!({
        "required_roles": plan.required_roles,
        "estimated_fte": plan.estimated_fte,
        "shared_resources": plan.shared_resources,
        "budget_allocation": plan.budget_allocation,
        "model_used": result.model_used,
    }))
}

const DEFAULT_BRD_BUDGET: i64 = 150_000;
const DEFAULT_BRD_TIMELINE_WEEKS: u32 = 16;

/// Draft a business requirements document. Budget defaults to a tenth
/// of the estimated value when one exists.
pub async fn brd_generator(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let budget = idea
        .estimated_value
        .map(|v| v / 10)
        .unwrap_or(DEFAULT_BRD_BUDGET);

    let prompt = format!(
        "Draft a business requirements document for this idea.\n\
         Title: {}\nProblem: {}\nSolution: {}\nExpected benefit: {}\n\n\
         Respond with JSON only: {{\"executive_summary\": \"...\", \"objectives\": [\"...\"], \
         \"functional_requirements\": [\"...\"], \"success_metrics\": [\"...\"]}}",
        idea.title, idea.problem_statement, idea.proposed_solution, idea.expected_benefit
    );
    let result = executor
        .call(
            TaskType::BrdGeneration,
            &prompt,
            Some("You write concise hospital BRDs. Respond with strict JSON."),
        )
        .await;

    #[derive(Deserialize)]
    struct Brd {
        executive_summary: String,
        objectives: Vec<String>,
        functional_requirements: Vec<String>,
        success_metrics: Vec<String>,
    }
    let brd = result
        .parse_json(Brd {
            executive_summary: format!("Pilot proposal for: {}", idea.title),
            objectives: vec!["Validate the proposed workflow with one pilot unit".to_string()],
            functional_requirements: vec!["To be elaborated with stakeholders".to_string()],
            success_metrics: vec!["Pilot adoption and measured benefit vs baseline".to_string()],
        })
        .into_value();

    Ok(json!({
        "executive_summary": brd.executive_summary,
        "objectives": brd.objectives,
        "functional_requirements": brd.functional_requirements,
        "success_metrics": brd.success_metrics,
        "estimated_budget": budget,
        "timeline_weeks": DEFAULT_BRD_TIMELINE_WEEKS,
        "model_used": result.model_used,
    }))
}

/// Innovation-journey phases with their fixed guidance.
const PHASE_GUIDANCE: &[(&str, &str, &[&str], &str, &str)] = &[
    (
        "define",
        "Sharpen the problem statement and identify who feels it most",
        &["Problem statement", "Stakeholder map"],
        "Problem validated with at least three affected staff",
        "1-2 weeks",
    ),
    (
        "research",
        "Gather evidence on the problem's frequency, cost, and existing workarounds",
        &["Baseline metrics", "Literature and vendor scan"],
        "Quantified baseline agreed with sponsors",
        "2-4 weeks",
    ),
    (
        "co-create",
        "Workshop candidate solutions with frontline staff",
        &["Solution concepts", "Priority ranking"],
        "One concept selected with frontline buy-in",
        "2-3 weeks",
    ),
    (
        "design-value",
        "Model the financial and experience value of the selected concept",
        &["Value model", "Cost estimate"],
        "Value case reviewed by finance partner",
        "2-3 weeks",
    ),
    (
        "prototype",
        "Build the smallest testable version of the solution",
        &["Working prototype", "Test protocol"],
        "Prototype demonstrated end to end",
        "4-6 weeks",
    ),
    (
        "pilot",
        "Run the solution in one live unit and measure against baseline",
        &["Pilot results", "Scale recommendation"],
        "Measured results support a scale or stop decision",
        "8-12 weeks",
    ),
];

/// Phase-aware coaching: fixed guidance for the idea's current phase
/// plus tailored advice from the routed model.
pub async fn ai_coach(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let (phase, focus, deliverables, exit_criteria, duration) = PHASE_GUIDANCE
        .iter()
        .find(|(name, ..)| *name == idea.phase)
        .copied()
        .unwrap_or(PHASE_GUIDANCE[0]);

    let prompt = format!(
        "An innovator is in the '{}' phase of developing this idea: {}.\n\
         Phase focus: {}.\n\n\
         Respond with JSON: {{\"advice\": \"<three sentences of specific next-step advice>\"}}",
        phase, idea.title, focus
    );
    let result = executor.call(TaskType::Coaching, &prompt, None).await;

    #[derive(Deserialize)]
    struct Advice {
        advice: String,
    }
    let advice = result
        .parse_json(Advice {
            advice: format!("Focus on the current phase goal: {}.", focus),
        })
        .into_value();

    Ok(json!({
        "phase": phase,
        "focus": focus,
        "deliverables": deliverables,
        "exit_criteria": exit_criteria,
        "typical_duration": duration,
        "advice": advice.advice,
        "model_used": result.model_used,
    }))
}

/// Reference architecture patterns scored against the idea's wording.
const ARCHITECTURE_PATTERNS: &[(&str, &str, &str)] = &[
    (
        "Power Platform Workflow",
        "forms approvals routing workflow tasks requests tracking notifications",
        "Low-code forms and automated routing on the existing tenant",
    ),
    (
        "EHR Integration Service",
        "epic mychart patient chart orders clinical records integration interface",
        "FHIR-based service surfacing or writing clinical data",
    ),
    (
        "Analytics Dashboard",
        "metrics dashboard reporting trends analytics visibility monitoring",
        "Warehouse-backed dashboard with scheduled refresh",
    ),
    (
        "Mobile Companion App",
        "mobile phone bedside tablet staff rounding alerts",
        "Lightweight mobile front end over existing services",
    ),
    (
        "RPA Task Automation",
        "manual repetitive data entry transcription scheduling batch",
        "Attended bot automating the highest-volume manual step",
    ),
];

fn score_pattern(idea: &Idea, name: &str, use_case: &str) -> i64 {
    let text = idea.search_text().to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut score = 0i64;
    for word in use_case.split_whitespace() {
        if words.contains(&word) {
            score += 2;
        }
    }
    for word in words.iter().filter(|w| w.len() > 4) {
        if use_case.contains(*word) {
            score += 1;
        }
    }
    let name_lower = name.to_lowercase();
    for word in name_lower.split_whitespace().filter(|w| w.len() > 3) {
        if words.contains(&word) {
            score += 3;
        }
    }
    score
}

/// Rank the pattern catalog against the idea and attach model design
/// notes. Pattern ranking is deterministic; only the notes need a model.
pub async fn solution_architecture(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let mut ranked: Vec<(i64, &str, &str)> = ARCHITECTURE_PATTERNS
        .iter()
        .map(|(name, use_case, summary)| (score_pattern(idea, name, use_case), *name, *summary))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.truncate(3);

    let top_names: Vec<&str> = ranked.iter().map(|(_, name, _)| *name).collect();
    let prompt = format!(
        "Candidate architecture patterns for '{}': {:?}.\n\
         Solution sketch: {}\n\n\
         Respond with JSON: {{\"design_notes\": \"<three sentences on how to combine these patterns>\"}}",
        idea.title, top_names, idea.proposed_solution
    );
    let result = executor.call(TaskType::SolutionArchitecture, &prompt, None).await;

    #[derive(Deserialize)]
    struct Notes {
        design_notes: String,
    }
    let notes = result
        .parse_json(Notes {
            design_notes: "Start with the highest-ranked pattern and validate integration points early."
                .to_string(),
        })
        .into_value();

    let patterns: Vec<Value> = ranked
        .iter()
        .map(|(score, name, summary)| {
            json!({ "pattern": name, "relevance": score, "summary": summary })
        })
        .collect();

    Ok(json!({
        "recommended_patterns": patterns,
        "design_notes": notes.design_notes,
        "model_used": result.model_used,
    }))
}

/// Embed the idea, rank deployed solutions, and classify the overlap.
/// An empty index degrades to a fixed example set, never an error.
pub async fn similarity_matcher(
    embedder: &Embedder,
    index: &SimilarityIndex,
    idea: &Idea,
) -> Result<Value> {
    let report = if index.is_empty() {
        matcher::fallback_matches(idea.estimated_value)
    } else {
        let vector = embedder.embed(&idea.search_text()).await;
        let hits = index.query(&vector, index.len());
        matcher::classify(&hits, idea.estimated_value)
    };
    Ok(serde_json::to_value(report)?)
}

/// Plan who should hear about this idea and through which channel.
pub async fn notification_intelligence(executor: &CallExecutor, idea: &Idea) -> Result<Value> {
    let prompt = format!(
        "Plan stakeholder notifications for a newly analyzed innovation idea.\n\
         Title: {}\nCategory: {}\n\n\
         Respond with JSON only: {{\"notifications\": [{{\"audience\": \"...\", \
         \"channel\": \"email|teams|digest\", \"send_window\": \"...\", \"message\": \"...\"}}], \
         \"escalation_path\": [\"<role in order>\"]}}",
        idea.title,
        idea.category.as_deref().unwrap_or("general")
    );
    let result = executor.call(TaskType::Notifications, &prompt, None).await;

    #[derive(Deserialize)]
    struct NotificationPlan {
        notifications: Vec<Value>,
        escalation_path: Vec<String>,
    }
    let plan = result
        .parse_json(NotificationPlan {
            notifications: vec![json!({
                "audience": "Innovation council",
                "channel": "digest",
                "send_window": "weekly digest",
                "message": format!("New idea analyzed: {}", idea.title),
            })],
            escalation_path: vec![
                "Unit manager".to_string(),
                "Innovation program lead".to_string(),
            ],
        })
        .into_value();

    Ok(json!({
        "notifications": plan.notifications,
        "escalation_path": plan.escalation_path,
        "model_used": result.model_used,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderPool;
    use crate::router::ModelRegistry;
    use crate::store;
    use crate::types::IdeaDraft;
    use std::sync::Arc;

    fn offline_executor() -> CallExecutor {
        CallExecutor::new(
            Arc::new(ModelRegistry::from_env()),
            Arc::new(ProviderPool::disconnected()),
        )
    }

    fn idea(title: &str, problem: &str, solution: &str) -> Idea {
        Idea::from_draft(IdeaDraft {
            title: title.to_string(),
            problem_statement: problem.to_string(),
            proposed_solution: solution.to_string(),
            expected_benefit: "Better care".to_string(),
            submitter_name: None,
            category: None,
            hospital: None,
        })
    }

    #[tokio::test]
    async fn test_system_context_detects_platforms() {
        let executor = offline_executor();
        let idea = idea(
            "Epic order alerts",
            "Nurses miss new Epic orders and medication changes in Pyxis",
            "Push alerts through Azure functions",
        );
        let payload = system_context(&executor, &idea).await.unwrap();
        let detected: Vec<String> =
            serde_json::from_value(payload["detected_systems"].clone()).unwrap();
        assert!(detected.contains(&"Epic".to_string()));
        assert!(detected.contains(&"Pyxis".to_string()));
        assert!(detected.contains(&"Azure".to_string()));
        // 3 + 1.5 * 3
        assert_eq!(payload["integration_complexity"], 7.5);
    }

    #[tokio::test]
    async fn test_system_context_complexity_caps_at_ten() {
        let executor = offline_executor();
        let idea = idea(
            "Everything integration",
            "epic mychart pyxis medication azure microsoft",
            "power apps and power bi everywhere",
        );
        let payload = system_context(&executor, &idea).await.unwrap();
        assert!(payload["integration_complexity"].as_f64().unwrap() <= 10.0);
    }

    #[tokio::test]
    async fn test_feasibility_defaults_offline() {
        let executor = offline_executor();
        let payload = feasibility(&executor, &idea("t", "p", "s")).await.unwrap();
        // All five lenses default to 7 with no provider.
        assert_eq!(payload["overall_score"], 7.0);
        let prob = payload["approval_probability"].as_f64().unwrap();
        assert!((prob - 0.85).abs() < 1e-9);
        assert_eq!(payload["recommendation"], "conditional-approve");
        assert_eq!(payload["dimensions"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_brd_budget_from_estimated_value() {
        let executor = offline_executor();
        let mut idea = idea("t", "p", "s");
        idea.estimated_value = Some(2_000_000);
        let payload = brd_generator(&executor, &idea).await.unwrap();
        assert_eq!(payload["estimated_budget"], 200_000);
        assert_eq!(payload["timeline_weeks"], 16);

        idea.estimated_value = None;
        let payload = brd_generator(&executor, &idea).await.unwrap();
        assert_eq!(payload["estimated_budget"], 150_000);
    }

    #[tokio::test]
    async fn test_coach_unknown_phase_falls_back_to_define() {
        let executor = offline_executor();
        let mut idea = idea("t", "p", "s");
        idea.phase = "retired".to_string();
        let payload = ai_coach(&executor, &idea).await.unwrap();
        assert_eq!(payload["phase"], "define");
        assert!(payload["advice"].as_str().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_architecture_ranks_relevant_pattern_first() {
        let executor = offline_executor();
        let idea = idea(
            "Approval workflow for supply requests",
            "Paper forms and manual routing slow approvals",
            "Digital forms with automated routing and tracking notifications",
        );
        let payload = solution_architecture(&executor, &idea).await.unwrap();
        let patterns = payload["recommended_patterns"].as_array().unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0]["pattern"], "Power Platform Workflow");
    }

    #[tokio::test]
    async fn test_similarity_matcher_empty_index_uses_fallback() {
        let embedder = Embedder::offline();
        let index = SimilarityIndex::new();
        let payload = similarity_matcher(&embedder, &index, &idea("t", "p", "s"))
            .await
            .unwrap();
        assert_eq!(payload["matches"].as_array().unwrap().len(), 3);
        assert_eq!(payload["recommendation"], "modify-existing");
    }

    #[tokio::test]
    async fn test_strategic_fit_offline_defaults_to_low_priority() {
        let conn = store::init_memory_db().unwrap();
        let executor = offline_executor();
        let idea = idea("t", "p", "s");
        let payload = strategic_fit(&conn, &executor, &idea).await.unwrap();
        assert_eq!(payload["quadrant"], "Low Priority");
        assert_eq!(payload["value_score"], 5.0);
    }
}
