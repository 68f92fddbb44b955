//! idea-pipeline CLI
//!
//! Innovation decision support for the Meridian Health network.
//!
//! Run with: cargo run -- <command>

use anyhow::Result;
use idea_pipeline::{
    config::Settings,
    embedding::Embedder,
    executor::CallExecutor,
    index::SimilarityIndex,
    orchestrator::AnalysisEngine,
    provider::ProviderPool,
    router::ModelRegistry,
    rubric, seed, store,
    store::IdeaFilter,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "ideas" => {
            let filter = IdeaFilter {
                track: flag_value(&args, "--track="),
                status: flag_value(&args, "--status="),
                category: flag_value(&args, "--category="),
                search: flag_value(&args, "--search="),
            };
            run_list_ideas(&filter)
        }
        "analyze" => {
            let idea_id = args.get(2).map(|s| s.as_str()).unwrap_or("");
            if idea_id.is_empty() {
                eprintln!("Usage: analyze <idea-id>");
                return Ok(());
            }
            run_analyze(idea_id).await
        }
        "rubric" => {
            let idea_id = args.get(2).map(|s| s.as_str()).unwrap_or("");
            if idea_id.is_empty() {
                eprintln!("Usage: rubric <idea-id>");
                return Ok(());
            }
            run_rubric(idea_id).await
        }
        "score" => {
            // score <idea-id> <dimension>=<1-10> [...]
            let idea_id = args.get(2).map(|s| s.as_str()).unwrap_or("");
            if idea_id.is_empty() || args.len() < 4 {
                eprintln!("Usage: score <idea-id> <dimension>=<score> [...]");
                return Ok(());
            }
            run_manual_score(idea_id, &args[3..])
        }
        "match" => {
            let idea_id = args.get(2).map(|s| s.as_str()).unwrap_or("");
            if idea_id.is_empty() {
                eprintln!("Usage: match <idea-id>");
                return Ok(());
            }
            run_match(idea_id).await
        }
        "upvote" => {
            let idea_id = args.get(2).map(|s| s.as_str()).unwrap_or("");
            if idea_id.is_empty() {
                eprintln!("Usage: upvote <idea-id>");
                return Ok(());
            }
            run_upvote(idea_id)
        }
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn flag_value(args: &[String], prefix: &str) -> Option<String> {
    args.iter()
        .find(|a| a.starts_with(prefix))
        .map(|a| a[prefix.len()..].to_string())
}

fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idea-pipeline")
}

fn open_store() -> Result<rusqlite::Connection> {
    let db_path = get_data_dir().join("ideas.db");
    let conn = store::init_db(&db_path)?;
    seed::seed_if_empty(&conn)?;
    Ok(conn)
}

/// Build the full analysis engine: providers from the environment, the
/// similarity index from every stored solution.
async fn build_engine() -> Result<AnalysisEngine> {
    let conn = open_store()?;

    let pool = Arc::new(ProviderPool::from_settings(&Settings::from_env()));
    let executor = CallExecutor::new(Arc::new(ModelRegistry::from_env()), pool.clone());
    let embedder = Embedder::new(pool.embedding_client().cloned());

    let mut index = SimilarityIndex::new();
    for solution in store::all_solutions(&conn)? {
        let text = format!("{} {}", solution.title, solution.description);
        let vector = embedder.embed(&text).await;
        index.insert(vector, solution);
    }
    tracing::info!(solutions = index.len(), "similarity index built");

    Ok(AnalysisEngine::new(conn, executor, embedder, index))
}

fn run_list_ideas(filter: &IdeaFilter) -> Result<()> {
    let conn = open_store()?;
    let ideas = store::list_ideas(&conn, filter)?;

    println!("\n┌──────────────────────────────────────────────────────────────┐");
    println!("│ 💡 IDEA PIPELINE                                             │");
    println!("└──────────────────────────────────────────────────────────────┘\n");

    if ideas.is_empty() {
        println!("No ideas match the filter.");
        return Ok(());
    }

    for idea in &ideas {
        println!(
            "  [{:>3}▲] {} — {}",
            idea.upvotes,
            idea.id,
            idea.title
        );
        println!(
            "         {} | {} | phase: {}",
            idea.hospital.as_deref().unwrap_or("unassigned"),
            idea.category.as_deref().unwrap_or("uncategorized"),
            idea.phase
        );
    }
    println!("\n{} idea(s)", ideas.len());
    Ok(())
}

async fn run_analyze(idea_id: &str) -> Result<()> {
    let engine = build_engine().await?;
    let report = engine.run_all(idea_id).await?;

    println!("\n┌──────────────────────────────────────────────────────────────┐");
    println!("│ 🔬 FULL ANALYSIS                                             │");
    println!("└──────────────────────────────────────────────────────────────┘\n");

    println!("Idea: {}", report.idea_id);
    println!("Models used: {}", report.models_used.join(", "));
    println!();

    for result in &report.agents {
        let marker = if result.succeeded() { "✅" } else { "❌" };
        println!("{} {}", marker, result.agent);
    }
    println!();

    println!("OVERALL RECOMMENDATION:");
    println!("{}", serde_json::to_string_pretty(&report.overall_recommendation)?);
    println!();
    println!("AGENT DETAIL:");
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(report.agent_payloads()))?
    );
    Ok(())
}

async fn run_rubric(idea_id: &str) -> Result<()> {
    let engine = build_engine().await?;
    let idea = store::get_idea(engine.conn(), idea_id)?;
    let summary = rubric::ai_recommend(engine.conn(), engine.executor(), &idea).await?;

    println!("\n┌──────────────────────────────────────────────────────────────┐");
    println!("│ 📊 RUBRIC SCORES                                             │");
    println!("└──────────────────────────────────────────────────────────────┘\n");

    println!("Idea: {} — {}", idea.id, idea.title);
    println!();
    for score in &summary.scores {
        let source = if score.manual_score.is_some() { "manual" } else { "ai" };
        println!(
            "  {:<18} {:>4.1}  ({}, weight {:.2})",
            score.dimension,
            score.effective(),
            source,
            score.weight
        );
    }
    println!();
    println!("Value score:  {:.2}", summary.value_score);
    println!("Effort score: {:.2}", summary.effort_score);
    println!("Quadrant:     {}", summary.quadrant);
    Ok(())
}

fn run_manual_score(idea_id: &str, assignments: &[String]) -> Result<()> {
    let conn = open_store()?;
    store::get_idea(&conn, idea_id)?;

    let mut overrides = BTreeMap::new();
    for assignment in assignments {
        let Some((dimension, value)) = assignment.split_once('=') else {
            eprintln!("Skipping '{}': expected <dimension>=<score>", assignment);
            continue;
        };
        match value.parse::<f64>() {
            Ok(score) if (1.0..=10.0).contains(&score) => {
                overrides.insert(dimension.to_string(), score);
            }
            _ => eprintln!("Skipping '{}': score must be 1-10", assignment),
        }
    }

    rubric::save_manual_scores(&conn, idea_id, &overrides)?;
    let summary = rubric::get_rubric(&conn, idea_id)?;
    println!("Saved {} manual score(s).", overrides.len());
    println!(
        "Value {:.2} / Effort {:.2} → {}",
        summary.value_score, summary.effort_score, summary.quadrant
    );
    Ok(())
}

async fn run_match(idea_id: &str) -> Result<()> {
    let engine = build_engine().await?;
    let report = engine.run_all(idea_id).await?;
    let payloads = report.agent_payloads();

    println!("\n┌──────────────────────────────────────────────────────────────┐");
    println!("│ 🔎 SIMILAR DEPLOYED SOLUTIONS                                │");
    println!("└──────────────────────────────────────────────────────────────┘\n");

    println!("{}", serde_json::to_string_pretty(&payloads["similarity_matcher"])?);
    Ok(())
}

fn run_upvote(idea_id: &str) -> Result<()> {
    let conn = open_store()?;
    let total = store::upvote_idea(&conn, idea_id)?;
    println!("{} now has {} upvote(s).", idea_id, total);
    Ok(())
}

fn print_help() {
    println!("idea-pipeline - Innovation Decision Support");
    println!();
    println!("Commands:");
    println!("  ideas [--search=X] [--category=X] [--status=X] [--track=X]");
    println!("                        List ideas, most upvoted first");
    println!("  analyze <idea-id>     Run the full nine-agent analysis");
    println!("  rubric <idea-id>      AI-score the six rubric dimensions");
    println!("  score <idea-id> <dim>=<1-10> [...]");
    println!("                        Save manual rubric overrides");
    println!("  match <idea-id>       Show similar deployed solutions");
    println!("  upvote <idea-id>      Add an upvote");
    println!("  help                  Show this help");
}
