//! Demo dataset for the Meridian Health network.
//!
//! Loaded once into an empty database so the pipeline is explorable
//! out of the box. Ideas get stable ids so they are easy to address
//! from the command line.

use crate::store;
use crate::types::{Idea, SolutionRecord};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

struct SeedIdea {
    id: &'static str,
    submitter: &'static str,
    title: &'static str,
    problem: &'static str,
    solution: &'static str,
    benefit: &'static str,
    category: &'static str,
    hospital: &'static str,
    phase: &'static str,
    upvotes: i64,
    estimated_value: Option<i64>,
}

const SEED_IDEAS: &[SeedIdea] = &[
    SeedIdea {
        id: "idea-001",
        submitter: "Dana Whitfield",
        title: "Overnight discharge lounge",
        problem: "Patients cleared for discharge after 19:00 occupy beds until morning because transport and pharmacy pickups stop",
        solution: "Staff a small discharge lounge with an evening pharmacy courier so cleared patients free their beds the same night",
        benefit: "Earlier bed turnover for ED admissions",
        category: "throughput",
        hospital: "Meridian General",
        phase: "research",
        upvotes: 14,
        estimated_value: Some(1_200_000),
    },
    SeedIdea {
        id: "idea-002",
        submitter: "Luis Herrera",
        title: "Pyxis restock prediction",
        problem: "Medication cabinets stock out mid-shift and nurses walk to central pharmacy for common meds",
        solution: "Use dispense history to predict Pyxis restock needs per unit and schedule proactive refills",
        benefit: "Fewer stockouts and less nurse walking time",
        category: "pharmacy",
        hospital: "Meridian East",
        phase: "define",
        upvotes: 9,
        estimated_value: Some(350_000),
    },
    SeedIdea {
        id: "idea-003",
        submitter: "Priya Raman",
        title: "MyChart pre-visit checklists",
        problem: "Specialty clinic visits stall when patients arrive without required labs or imaging",
        solution: "Push a visit-specific checklist through MyChart two weeks ahead with one-tap scheduling for missing items",
        benefit: "Fewer rescheduled specialty visits",
        category: "ambulatory",
        hospital: "Meridian Children's",
        phase: "co-create",
        upvotes: 22,
        estimated_value: Some(5_000_000),
    },
    SeedIdea {
        id: "idea-004",
        submitter: "Anonymous",
        title: "Quiet-hours overhead paging",
        problem: "Non-urgent overhead pages wake patients between 21:00 and 06:00",
        solution: "Route non-urgent pages to staff phones during quiet hours, keeping overhead for codes only",
        benefit: "Improved patient sleep and HCAHPS quiet scores",
        category: "patient-experience",
        hospital: "Meridian General",
        phase: "prototype",
        upvotes: 31,
        estimated_value: None,
    },
    SeedIdea {
        id: "idea-005",
        submitter: "Marcus Cole",
        title: "Wheelchair fleet tracking",
        problem: "Transport aides spend the start of every shift hunting for wheelchairs left around the campus",
        solution: "Tag wheelchairs with low-cost beacons and show live locations on a Power BI floor map",
        benefit: "Faster patient transport starts",
        category: "operations",
        hospital: "Meridian West",
        phase: "define",
        upvotes: 6,
        estimated_value: Some(180_000),
    },
    SeedIdea {
        id: "idea-006",
        submitter: "Elena Moreau",
        title: "Interpreter demand forecasting",
        problem: "Interpreter services are overbooked on Mondays and idle on Thursdays, causing visit delays",
        solution: "Forecast interpreter demand from the scheduling system and shift staffing to match language mix by day",
        benefit: "Shorter waits for non-English-speaking patients",
        category: "access",
        hospital: "Meridian East",
        phase: "design-value",
        upvotes: 11,
        estimated_value: Some(420_000),
    },
    SeedIdea {
        id: "idea-007",
        submitter: "Tom Adeyemi",
        title: "OR case cart photo verification",
        problem: "Missing instruments are discovered after the patient is in the room, delaying first cases",
        solution: "Photograph each completed case cart and have a second tech verify against the preference card before transport",
        benefit: "Fewer first-case delays",
        category: "surgical-services",
        hospital: "Meridian General",
        phase: "pilot",
        upvotes: 18,
        estimated_value: Some(900_000),
    },
    SeedIdea {
        id: "idea-008",
        submitter: "Sofia Nilsen",
        title: "New-hire shadow shift matching",
        problem: "New nurses are assigned shadow shifts by unit availability, not by the skills they need to see",
        solution: "Match new hires to shadow shifts using a simple skills checklist maintained in Power Apps",
        benefit: "Faster time to independent practice",
        category: "workforce",
        hospital: "Meridian Children's",
        phase: "define",
        upvotes: 4,
        estimated_value: None,
    },
];

const SEED_SOLUTIONS: &[(&str, &str, &str, &str, f64, i64)] = &[
    (
        "sol-001",
        "Automated Discharge Checklist",
        "Meridian General",
        "Epic-integrated checklist that flags pending discharge blockers for case management each morning",
        2.8,
        750_000,
    ),
    (
        "sol-002",
        "Bedside Tablet Requests",
        "Meridian East",
        "Tablets letting patients request blankets, water, and non-urgent help without calling the nurse",
        1.9,
        300_000,
    ),
    (
        "sol-003",
        "Shift Handoff Summaries",
        "Meridian Children's",
        "Structured nurse handoff notes auto-drafted from flowsheet data for review at shift change",
        3.4,
        620_000,
    ),
    (
        "sol-004",
        "Pharmacy Courier Scheduling",
        "Meridian West",
        "Scheduled courier loops between central pharmacy and units replacing ad hoc stat runs",
        2.2,
        410_000,
    ),
    (
        "sol-005",
        "ED Fast-Track Triage Board",
        "Meridian General",
        "Live triage board separating fast-track eligible patients to a dedicated treatment area",
        4.1,
        1_500_000,
    ),
    (
        "sol-006",
        "Linen Usage Analytics",
        "Meridian East",
        "Power BI dashboard tracking linen consumption by unit against census to cut overordering",
        1.6,
        150_000,
    ),
    (
        "sol-007",
        "Imaging No-Show Reminders",
        "Meridian Children's",
        "Text reminder sequence with one-tap rescheduling for outpatient imaging appointments",
        3.0,
        540_000,
    ),
    (
        "sol-008",
        "Code Cart Expiry Tracking",
        "Meridian West",
        "Barcode scans on cart checks with automatic alerts ahead of medication expiry dates",
        2.5,
        220_000,
    ),
    (
        "sol-009",
        "Volunteer Wayfinding Kiosks",
        "Meridian General",
        "Lobby kiosks with printed walking directions, staffed by volunteers at peak hours",
        1.4,
        90_000,
    ),
    (
        "sol-010",
        "Surgical Block Release Alerts",
        "Meridian East",
        "Automatic notification to waitlisted surgeons when OR block time is released inside 72 hours",
        3.8,
        1_100_000,
    ),
];

/// Load the demo dataset unless ideas already exist. Returns the number
/// of ideas and solutions inserted.
pub fn seed_if_empty(conn: &Connection) -> Result<(usize, usize)> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM ideas", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok((0, 0));
    }

    for seed in SEED_IDEAS {
        let idea = Idea {
            id: seed.id.to_string(),
            submitter_name: seed.submitter.to_string(),
            title: seed.title.to_string(),
            problem_statement: seed.problem.to_string(),
            proposed_solution: seed.solution.to_string(),
            expected_benefit: seed.benefit.to_string(),
            category: Some(seed.category.to_string()),
            hospital: Some(seed.hospital.to_string()),
            track: None,
            quadrant: None,
            phase: seed.phase.to_string(),
            status: "in-review".to_string(),
            upvotes: seed.upvotes,
            estimated_value: seed.estimated_value,
            estimated_roi: None,
            created_at: Utc::now(),
        };
        store::insert_idea(conn, &idea)?;
    }

    for (id, title, hospital, description, roi, value) in SEED_SOLUTIONS {
        store::insert_solution(
            conn,
            &SolutionRecord {
                id: id.to_string(),
                title: title.to_string(),
                hospital: hospital.to_string(),
                description: description.to_string(),
                status: "deployed".to_string(),
                contact: "innovation@meridianhealth.org".to_string(),
                roi: *roi,
                value: *value,
            },
        )?;
    }

    info!(
        ideas = SEED_IDEAS.len(),
        solutions = SEED_SOLUTIONS.len(),
        "seeded demo dataset"
    );
    Ok((SEED_IDEAS.len(), SEED_SOLUTIONS.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_empty_database() {
        let conn = store::init_memory_db().unwrap();
        let (ideas, solutions) = seed_if_empty(&conn).unwrap();
        assert_eq!(ideas, SEED_IDEAS.len());
        assert_eq!(solutions, SEED_SOLUTIONS.len());

        let loaded = store::get_idea(&conn, "idea-003").unwrap();
        assert_eq!(loaded.estimated_value, Some(5_000_000));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let conn = store::init_memory_db().unwrap();
        seed_if_empty(&conn).unwrap();
        let (ideas, solutions) = seed_if_empty(&conn).unwrap();
        assert_eq!((ideas, solutions), (0, 0));
        let all = store::list_ideas(&conn, &store::IdeaFilter::default()).unwrap();
        assert_eq!(all.len(), SEED_IDEAS.len());
    }
}
