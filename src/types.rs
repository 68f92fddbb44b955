//! Core types for the innovation idea pipeline.
//!
//! Ideas flow in as free text, get analyzed by nine independent agents,
//! and come out with structured scores, a quadrant placement, and a
//! build-vs-reuse recommendation against already-deployed solutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An innovation proposal submitted by a team member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub submitter_name: String,
    pub title: String,
    pub problem_statement: String,
    pub proposed_solution: String,
    pub expected_benefit: String,
    pub category: Option<String>,
    pub hospital: Option<String>,
    pub track: Option<String>,
    pub quadrant: Option<String>,
    pub phase: String,
    pub status: String,
    pub upvotes: i64,
    pub estimated_value: Option<i64>,
    pub estimated_roi: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Fields a submitter provides; the rest are defaulted at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaDraft {
    pub title: String,
    pub problem_statement: String,
    pub proposed_solution: String,
    pub expected_benefit: String,
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
}

impl Idea {
    pub fn from_draft(draft: IdeaDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            submitter_name: draft.submitter_name.unwrap_or_else(|| "Anonymous".to_string()),
            title: draft.title,
            problem_statement: draft.problem_statement,
            proposed_solution: draft.proposed_solution,
            expected_benefit: draft.expected_benefit,
            category: draft.category,
            hospital: draft.hospital,
            track: None,
            quadrant: None,
            phase: "define".to_string(),
            status: "in-review".to_string(),
            upvotes: 0,
            estimated_value: None,
            estimated_roi: None,
            created_at: Utc::now(),
        }
    }

    /// Concatenated text used for embedding and keyword detection.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title, self.problem_statement, self.proposed_solution
        )
    }
}

/// A solution already deployed somewhere in the hospital network.
///
/// Inserted once at startup into the similarity index; immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub id: String,
    pub title: String,
    pub hospital: String,
    pub description: String,
    pub status: String,
    pub contact: String,
    pub roi: f64,
    pub value: i64,
}

/// Confidence bucket for a similarity match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    High,
    Moderate,
    Low,
}

impl MatchTier {
    /// Bucket a normalized similarity score.
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= 0.95 {
            MatchTier::Exact
        } else if similarity >= 0.80 {
            MatchTier::High
        } else if similarity >= 0.65 {
            MatchTier::Moderate
        } else {
            MatchTier::Low
        }
    }
}

/// Two-axis (value, effort) triage label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "Quick Wins")]
    QuickWins,
    #[serde(rename = "Big Bets")]
    BigBets,
    #[serde(rename = "Low Priority")]
    LowPriority,
    #[serde(rename = "Parking Lot")]
    ParkingLot,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::QuickWins => "Quick Wins",
            Quadrant::BigBets => "Big Bets",
            Quadrant::LowPriority => "Low Priority",
            Quadrant::ParkingLot => "Parking Lot",
        }
    }

    /// Quadrants that justify moving an idea forward.
    pub fn is_favorable(&self) -> bool {
        matches!(self, Quadrant::QuickWins | Quadrant::BigBets)
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final decision synthesized from the agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approve,
    ConditionalApprove,
    Defer,
    Reject,
}

/// Aggregate verdict derived from feasibility and strategic fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallRecommendation {
    pub decision: Decision,
    pub reasoning: String,
    pub feasibility_score: f64,
    pub strategic_quadrant: String,
    pub approval_probability: f64,
}

/// One agent's contribution to an analysis run.
///
/// A failed agent records its error message instead of a payload;
/// siblings are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRunResult {
    pub agent: &'static str,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl AgentRunResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Payload for the aggregate report: the agent output, or an
    /// error-tagged object when the agent failed.
    pub fn report_payload(&self) -> serde_json::Value {
        match &self.error {
            Some(msg) => serde_json::json!({ "error": msg }),
            None => self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_tier_boundaries() {
        assert_eq!(MatchTier::from_similarity(0.95), MatchTier::Exact);
        assert_eq!(MatchTier::from_similarity(0.949), MatchTier::High);
        assert_eq!(MatchTier::from_similarity(0.80), MatchTier::High);
        assert_eq!(MatchTier::from_similarity(0.799), MatchTier::Moderate);
        assert_eq!(MatchTier::from_similarity(0.65), MatchTier::Moderate);
        assert_eq!(MatchTier::from_similarity(0.64), MatchTier::Low);
        assert_eq!(MatchTier::from_similarity(1.0), MatchTier::Exact);
    }

    #[test]
    fn test_quadrant_labels_round_trip() {
        let q: Quadrant = serde_json::from_str("\"Quick Wins\"").unwrap();
        assert_eq!(q, Quadrant::QuickWins);
        assert_eq!(
            serde_json::to_string(&Quadrant::ParkingLot).unwrap(),
            "\"Parking Lot\""
        );
    }

    #[test]
    fn test_decision_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&Decision::ConditionalApprove).unwrap(),
            "\"CONDITIONAL_APPROVE\""
        );
    }

    #[test]
    fn test_idea_from_draft_defaults() {
        let idea = Idea::from_draft(IdeaDraft {
            title: "t".into(),
            problem_statement: "p".into(),
            proposed_solution: "s".into(),
            expected_benefit: "b".into(),
            submitter_name: None,
            category: None,
            hospital: None,
        });
        assert_eq!(idea.submitter_name, "Anonymous");
        assert_eq!(idea.phase, "define");
        assert_eq!(idea.status, "in-review");
        assert_eq!(idea.upvotes, 0);
    }
}
