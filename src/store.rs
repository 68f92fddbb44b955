//! SQLite-backed store for ideas, deployed solutions, and rubric scores.

use crate::types::{Idea, SolutionRecord};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ideas (
    id TEXT PRIMARY KEY,
    submitter_name TEXT NOT NULL,
    title TEXT NOT NULL,
    problem_statement TEXT NOT NULL,
    proposed_solution TEXT NOT NULL,
    expected_benefit TEXT NOT NULL,
    category TEXT,
    hospital TEXT,
    track TEXT,
    quadrant TEXT,
    phase TEXT NOT NULL DEFAULT 'define',
    status TEXT NOT NULL DEFAULT 'in-review',
    upvotes INTEGER NOT NULL DEFAULT 0,
    estimated_value INTEGER,
    estimated_roi REAL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS solutions (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    hospital TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    contact TEXT NOT NULL,
    roi REAL NOT NULL,
    value INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rubric_scores (
    idea_id TEXT NOT NULL,
    dimension TEXT NOT NULL,
    ai_score REAL NOT NULL DEFAULT 5.0,
    manual_score REAL,
    rationale TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (idea_id, dimension)
);

CREATE INDEX IF NOT EXISTS idx_ideas_status ON ideas(status);
CREATE INDEX IF NOT EXISTS idx_ideas_track ON ideas(track);
"#;

/// Open (creating if needed) the database at `path` and apply the schema.
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.execute_batch(SCHEMA).context("Failed to apply schema")?;
    Ok(conn)
}

/// In-memory database with the schema applied. Tests and dry runs.
pub fn init_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    conn.execute_batch(SCHEMA).context("Failed to apply schema")?;
    Ok(conn)
}

pub fn insert_idea(conn: &Connection, idea: &Idea) -> Result<()> {
    conn.execute(
        "INSERT INTO ideas (id, submitter_name, title, problem_statement, proposed_solution,
            expected_benefit, category, hospital, track, quadrant, phase, status, upvotes,
            estimated_value, estimated_roi, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            idea.id,
            idea.submitter_name,
            idea.title,
            idea.problem_statement,
            idea.proposed_solution,
            idea.expected_benefit,
            idea.category,
            idea.hospital,
            idea.track,
            idea.quadrant,
            idea.phase,
            idea.status,
            idea.upvotes,
            idea.estimated_value,
            idea.estimated_roi,
            idea.created_at.to_rfc3339(),
        ],
    )
    .context("Failed to insert idea")?;
    Ok(())
}

fn idea_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Idea> {
    let created_at: String = row.get(15)?;
    Ok(Idea {
        id: row.get(0)?,
        submitter_name: row.get(1)?,
        title: row.get(2)?,
        problem_statement: row.get(3)?,
        proposed_solution: row.get(4)?,
        expected_benefit: row.get(5)?,
        category: row.get(6)?,
        hospital: row.get(7)?,
        track: row.get(8)?,
        quadrant: row.get(9)?,
        phase: row.get(10)?,
        status: row.get(11)?,
        upvotes: row.get(12)?,
        estimated_value: row.get(13)?,
        estimated_roi: row.get(14)?,
        created_at: created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}

const IDEA_COLUMNS: &str = "id, submitter_name, title, problem_statement, proposed_solution,
    expected_benefit, category, hospital, track, quadrant, phase, status, upvotes,
    estimated_value, estimated_roi, created_at";

/// Look up one idea. A missing id is the one error this pipeline
/// surfaces to the caller; there is no safe default idea.
pub fn get_idea(conn: &Connection, id: &str) -> Result<Idea> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM ideas WHERE id = ?1", IDEA_COLUMNS))
        .context("Failed to prepare idea lookup")?;
    let mut rows = stmt.query_map(params![id], idea_from_row)?;
    match rows.next() {
        Some(row) => Ok(row?),
        None => Err(anyhow!("Idea not found: {}", id)),
    }
}

/// Filter options for idea listings. Empty filter lists everything.
#[derive(Debug, Default, Clone)]
pub struct IdeaFilter {
    pub track: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// List ideas matching the filter, most-upvoted first.
pub fn list_ideas(conn: &Connection, filter: &IdeaFilter) -> Result<Vec<Idea>> {
    let mut sql = format!("SELECT {} FROM ideas WHERE 1=1", IDEA_COLUMNS);
    let mut args: Vec<String> = Vec::new();

    if let Some(track) = &filter.track {
        sql.push_str(&format!(" AND track = ?{}", args.len() + 1));
        args.push(track.clone());
    }
    if let Some(status) = &filter.status {
        sql.push_str(&format!(" AND status = ?{}", args.len() + 1));
        args.push(status.clone());
    }
    if let Some(category) = &filter.category {
        sql.push_str(&format!(" AND category = ?{}", args.len() + 1));
        args.push(category.clone());
    }
    if let Some(search) = &filter.search {
        let idx = args.len() + 1;
        sql.push_str(&format!(
            " AND (title LIKE ?{idx} OR problem_statement LIKE ?{idx} OR proposed_solution LIKE ?{idx})"
        ));
        args.push(format!("%{}%", search));
    }
    sql.push_str(" ORDER BY upvotes DESC, created_at DESC");

    let mut stmt = conn.prepare(&sql).context("Failed to prepare idea listing")?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), idea_from_row)?;
    let mut ideas = Vec::new();
    for row in rows {
        ideas.push(row?);
    }
    Ok(ideas)
}

/// Bump an idea's upvote count, returning the new total.
pub fn upvote_idea(conn: &Connection, id: &str) -> Result<i64> {
    let updated = conn
        .execute("UPDATE ideas SET upvotes = upvotes + 1 WHERE id = ?1", params![id])
        .context("Failed to record upvote")?;
    if updated == 0 {
        return Err(anyhow!("Idea not found: {}", id));
    }
    conn.query_row(
        "SELECT upvotes FROM ideas WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .context("Failed to read upvote count")
}

pub fn insert_solution(conn: &Connection, solution: &SolutionRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO solutions (id, title, hospital, description, status, contact, roi, value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            solution.id,
            solution.title,
            solution.hospital,
            solution.description,
            solution.status,
            solution.contact,
            solution.roi,
            solution.value,
        ],
    )
    .context("Failed to insert solution")?;
    Ok(())
}

/// Every deployed solution, for building the similarity index at startup.
pub fn all_solutions(conn: &Connection) -> Result<Vec<SolutionRecord>> {
    let mut stmt = conn
        .prepare("SELECT id, title, hospital, description, status, contact, roi, value FROM solutions")
        .context("Failed to prepare solution listing")?;
    let rows = stmt.query_map([], |row| {
        Ok(SolutionRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            hospital: row.get(2)?,
            description: row.get(3)?,
            status: row.get(4)?,
            contact: row.get(5)?,
            roi: row.get(6)?,
            value: row.get(7)?,
        })
    })?;
    let mut solutions = Vec::new();
    for row in rows {
        solutions.push(row?);
    }
    Ok(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdeaDraft;

    fn draft(title: &str) -> Idea {
        Idea::from_draft(IdeaDraft {
            title: title.to_string(),
            problem_statement: "p".to_string(),
            proposed_solution: "s".to_string(),
            expected_benefit: "b".to_string(),
            submitter_name: None,
            category: Some("operations".to_string()),
            hospital: None,
        })
    }

    #[test]
    fn test_insert_and_get_idea() {
        let conn = init_memory_db().unwrap();
        let idea = draft("Smart wheelchair dispatch");
        insert_idea(&conn, &idea).unwrap();
        let loaded = get_idea(&conn, &idea.id).unwrap();
        assert_eq!(loaded.title, "Smart wheelchair dispatch");
        assert_eq!(loaded.submitter_name, "Anonymous");
    }

    #[test]
    fn test_missing_idea_is_an_error() {
        let conn = init_memory_db().unwrap();
        let err = get_idea(&conn, "nope").unwrap_err();
        assert!(err.to_string().contains("Idea not found"));
    }

    #[test]
    fn test_list_filters_and_sorts_by_upvotes() {
        let conn = init_memory_db().unwrap();
        let a = draft("Pharmacy robot");
        let b = draft("Visitor kiosk");
        insert_idea(&conn, &a).unwrap();
        insert_idea(&conn, &b).unwrap();
        upvote_idea(&conn, &b.id).unwrap();
        upvote_idea(&conn, &b.id).unwrap();

        let all = list_ideas(&conn, &IdeaFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);

        let filtered = list_ideas(
            &conn,
            &IdeaFilter { search: Some("kiosk".to_string()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, b.id);
    }

    #[test]
    fn test_upvote_missing_idea_errors() {
        let conn = init_memory_db().unwrap();
        assert!(upvote_idea(&conn, "ghost").is_err());
    }

    #[test]
    fn test_init_db_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ideas.db");
        let conn = init_db(&path).unwrap();
        assert!(path.exists());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ideas", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_solutions_round_trip() {
        let conn = init_memory_db().unwrap();
        let solution = SolutionRecord {
            id: "sol-1".to_string(),
            title: "OR turnover tracking".to_string(),
            hospital: "Meridian North".to_string(),
            description: "Live room status board".to_string(),
            status: "deployed".to_string(),
            contact: "or-team@meridianhealth.org".to_string(),
            roi: 3.2,
            value: 800_000,
        };
        insert_solution(&conn, &solution).unwrap();
        let all = all_solutions(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, 800_000);
    }
}
