//! Six-dimension rubric scoring and quadrant placement.
//!
//! Each idea carries up to six rated dimensions split across a value
//! axis and an effort axis. AI ratings come from a structured call;
//! reviewers can override any dimension manually, and the override
//! wins without disturbing sibling dimensions. Axis scores and the
//! quadrant label are recomputed from stored scores on every read.

use crate::executor::CallExecutor;
use crate::router::TaskType;
use crate::types::{Idea, Quadrant};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Value,
    Effort,
}

/// A fixed rubric dimension. The six entries and their weights are
/// treated as configuration constants, not derived logic.
#[derive(Debug, Clone, Copy)]
pub struct RubricDimension {
    pub name: &'static str,
    pub weight: f64,
    pub axis: Axis,
}

pub const DIMENSIONS: [RubricDimension; 6] = [
    RubricDimension { name: "emotional_needs", weight: 0.20, axis: Axis::Value },
    RubricDimension { name: "drastic_change", weight: 0.15, axis: Axis::Effort },
    RubricDimension { name: "revenue_impact", weight: 0.25, axis: Axis::Value },
    RubricDimension { name: "pilot_complexity", weight: 0.15, axis: Axis::Effort },
    RubricDimension { name: "people_build", weight: 0.10, axis: Axis::Effort },
    RubricDimension { name: "technology_capex", weight: 0.15, axis: Axis::Effort },
];

pub const HIGH_VALUE_THRESHOLD: f64 = 6.5;
pub const HIGH_EFFORT_THRESHOLD: f64 = 6.0;

/// Place an idea on the value/effort grid.
pub fn calculate_quadrant(value_score: f64, effort_score: f64) -> Quadrant {
    let high_value = value_score >= HIGH_VALUE_THRESHOLD;
    let high_effort = effort_score >= HIGH_EFFORT_THRESHOLD;
    match (high_value, high_effort) {
        (true, false) => Quadrant::QuickWins,
        (true, true) => Quadrant::BigBets,
        (false, false) => Quadrant::LowPriority,
        (false, true) => Quadrant::ParkingLot,
    }
}

/// One stored dimension score. `manual_score` supersedes `ai_score`
/// when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub ai_score: f64,
    pub manual_score: Option<f64>,
    pub rationale: String,
    pub weight: f64,
    pub axis: Axis,
}

impl DimensionScore {
    pub fn effective(&self) -> f64 {
        self.manual_score.unwrap_or(self.ai_score)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RubricSummary {
    pub idea_id: String,
    pub scores: Vec<DimensionScore>,
    pub value_score: f64,
    pub effort_score: f64,
    pub quadrant: Quadrant,
}

/// Weighted mean of effective scores along one axis. Weights
/// renormalize within the axis so each axis sums to 1 on its own.
fn axis_score(scores: &[DimensionScore], axis: Axis) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for score in scores.iter().filter(|s| s.axis == axis) {
        weighted += score.effective() * score.weight;
        total_weight += score.weight;
    }
    if total_weight == 0.0 {
        return 0.0;
    }
    weighted / total_weight
}

fn dimension(name: &str) -> Option<&'static RubricDimension> {
    DIMENSIONS.iter().find(|d| d.name == name)
}

/// Store AI-sourced scores, one row per dimension. Existing manual
/// overrides survive the upsert.
pub fn save_ai_scores(
    conn: &Connection,
    idea_id: &str,
    scores: &BTreeMap<String, (f64, String)>,
) -> Result<()> {
    for (name, (score, rationale)) in scores {
        if dimension(name).is_none() {
            continue;
        }
        conn.execute(
            "INSERT INTO rubric_scores (idea_id, dimension, ai_score, rationale)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(idea_id, dimension)
             DO UPDATE SET ai_score = ?3, rationale = ?4",
            params![idea_id, name, score, rationale],
        )
        .context("Failed to save AI rubric score")?;
    }
    Ok(())
}

/// Apply manual overrides for the named dimensions only. Sibling
/// dimensions keep their prior scores untouched.
pub fn save_manual_scores(
    conn: &Connection,
    idea_id: &str,
    overrides: &BTreeMap<String, f64>,
) -> Result<()> {
    for (name, score) in overrides {
        if dimension(name).is_none() {
            continue;
        }
        conn.execute(
            "INSERT INTO rubric_scores (idea_id, dimension, ai_score, manual_score, rationale)
             VALUES (?1, ?2, 5.0, ?3, 'Manual score')
             ON CONFLICT(idea_id, dimension)
             DO UPDATE SET manual_score = ?3",
            params![idea_id, name, score],
        )
        .context("Failed to save manual rubric score")?;
    }
    Ok(())
}

/// Read the full rubric for an idea. Dimensions never scored default
/// to the midpoint 5 so the axes are always computable.
pub fn get_rubric(conn: &Connection, idea_id: &str) -> Result<RubricSummary> {
    let mut stmt = conn
        .prepare(
            "SELECT dimension, ai_score, manual_score, rationale
             FROM rubric_scores WHERE idea_id = ?1",
        )
        .context("Failed to prepare rubric query")?;

    let mut stored: BTreeMap<String, (f64, Option<f64>, String)> = BTreeMap::new();
    let rows = stmt.query_map(params![idea_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, Option<f64>>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    for row in rows {
        let (name, ai, manual, rationale) = row?;
        stored.insert(name, (ai, manual, rationale));
    }

    let scores: Vec<DimensionScore> = DIMENSIONS
        .iter()
        .map(|dim| match stored.get(dim.name) {
            Some((ai, manual, rationale)) => DimensionScore {
                dimension: dim.name.to_string(),
                ai_score: *ai,
                manual_score: *manual,
                rationale: rationale.clone(),
                weight: dim.weight,
                axis: dim.axis,
            },
            None => DimensionScore {
                dimension: dim.name.to_string(),
                ai_score: 5.0,
                manual_score: None,
                rationale: "Default score".to_string(),
                weight: dim.weight,
                axis: dim.axis,
            },
        })
        .collect();

    let value_score = axis_score(&scores, Axis::Value);
    let effort_score = axis_score(&scores, Axis::Effort);

    Ok(RubricSummary {
        idea_id: idea_id.to_string(),
        quadrant: calculate_quadrant(value_score, effort_score),
        scores,
        value_score,
        effort_score,
    })
}

#[derive(Debug, Deserialize)]
struct AiDimensionRating {
    score: f64,
    #[serde(default)]
    rationale: String,
}

/// Ask the routed model to rate all six dimensions, persist what comes
/// back, and return the recomputed rubric. Missing or malformed
/// dimensions land at the midpoint with a default rationale.
pub async fn ai_recommend(
    conn: &Connection,
    executor: &CallExecutor,
    idea: &Idea,
) -> Result<RubricSummary> {
    let dims: Vec<&str> = DIMENSIONS.iter().map(|d| d.name).collect();
    let prompt = format!(
        "Rate this innovation idea on six dimensions, each 1-10.\n\
         Title: {}\nProblem: {}\nSolution: {}\nExpected benefit: {}\n\n\
         Respond with JSON only: {{\"<dimension>\": {{\"score\": <1-10>, \"rationale\": \"<one sentence>\"}}}} \
         for exactly these dimensions: {}",
        idea.title,
        idea.problem_statement,
        idea.proposed_solution,
        idea.expected_benefit,
        dims.join(", "),
    );

    let result = executor
        .call(
            TaskType::StrategicFit,
            &prompt,
            Some("You are an innovation portfolio analyst. Respond with strict JSON."),
        )
        .await;

    let parsed = result.parse_json::<BTreeMap<String, AiDimensionRating>>(BTreeMap::new());
    let ratings = parsed.value();

    let mut scores: BTreeMap<String, (f64, String)> = BTreeMap::new();
    for dim in &DIMENSIONS {
        match ratings.get(dim.name) {
            Some(r) => {
                let rationale = if r.rationale.is_empty() {
                    "AI assessment".to_string()
                } else {
                    r.rationale.clone()
                };
                scores.insert(dim.name.to_string(), (r.score.clamp(1.0, 10.0), rationale));
            }
            None => {
                scores.insert(dim.name.to_string(), (5.0, "Default score".to_string()));
            }
        }
    }

    save_ai_scores(conn, &idea.id, &scores)?;
    get_rubric(conn, &idea.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(store::SCHEMA).unwrap();
        conn
    }

    fn set_all(conn: &Connection, idea_id: &str, score: f64) {
        let scores: BTreeMap<String, (f64, String)> = DIMENSIONS
            .iter()
            .map(|d| (d.name.to_string(), (score, "test".to_string())))
            .collect();
        save_ai_scores(conn, idea_id, &scores).unwrap();
    }

    #[test]
    fn test_all_fives_is_low_priority() {
        let conn = test_conn();
        set_all(&conn, "idea-1", 5.0);
        let rubric = get_rubric(&conn, "idea-1").unwrap();
        assert_eq!(rubric.value_score, 5.0);
        assert_eq!(rubric.effort_score, 5.0);
        assert_eq!(rubric.quadrant, Quadrant::LowPriority);
    }

    #[test]
    fn test_all_tens_is_big_bets() {
        let conn = test_conn();
        set_all(&conn, "idea-1", 10.0);
        assert_eq!(get_rubric(&conn, "idea-1").unwrap().quadrant, Quadrant::BigBets);
    }

    #[test]
    fn test_high_value_low_effort_is_quick_wins() {
        let conn = test_conn();
        let scores: BTreeMap<String, (f64, String)> = DIMENSIONS
            .iter()
            .map(|d| {
                let s = match d.axis {
                    Axis::Value => 10.0,
                    Axis::Effort => 1.0,
                };
                (d.name.to_string(), (s, "test".to_string()))
            })
            .collect();
        save_ai_scores(&conn, "idea-1", &scores).unwrap();
        let rubric = get_rubric(&conn, "idea-1").unwrap();
        assert_eq!(rubric.quadrant, Quadrant::QuickWins);
    }

    #[test]
    fn test_unscored_idea_defaults_to_midpoint() {
        let conn = test_conn();
        let rubric = get_rubric(&conn, "never-scored").unwrap();
        assert_eq!(rubric.scores.len(), 6);
        assert!(rubric.scores.iter().all(|s| s.ai_score == 5.0));
        assert_eq!(rubric.quadrant, Quadrant::LowPriority);
    }

    #[test]
    fn test_manual_save_preserves_siblings() {
        let conn = test_conn();
        set_all(&conn, "idea-1", 7.0);

        let mut overrides = BTreeMap::new();
        overrides.insert("revenue_impact".to_string(), 9.5);
        save_manual_scores(&conn, "idea-1", &overrides).unwrap();

        let rubric = get_rubric(&conn, "idea-1").unwrap();
        let revenue = rubric.scores.iter().find(|s| s.dimension == "revenue_impact").unwrap();
        assert_eq!(revenue.manual_score, Some(9.5));
        assert_eq!(revenue.effective(), 9.5);
        for sibling in rubric.scores.iter().filter(|s| s.dimension != "revenue_impact") {
            assert_eq!(sibling.ai_score, 7.0);
            assert!(sibling.manual_score.is_none());
        }
    }

    #[test]
    fn test_axis_weights_renormalize() {
        let conn = test_conn();
        // value dims 8 and 6; weighted: (8*0.20 + 6*0.25)/0.45
        let mut scores = BTreeMap::new();
        scores.insert("emotional_needs".to_string(), (8.0, "t".to_string()));
        scores.insert("revenue_impact".to_string(), (6.0, "t".to_string()));
        save_ai_scores(&conn, "idea-1", &scores).unwrap();
        let rubric = get_rubric(&conn, "idea-1").unwrap();
        let expected = (8.0 * 0.20 + 6.0 * 0.25) / 0.45;
        assert!((rubric.value_score - expected).abs() < 1e-9);
    }
}
