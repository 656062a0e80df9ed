mod config;
mod db;
mod error;
mod models;
mod notify;
mod session;
mod source;
mod store;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use db::Database;
use error::AppError;
use models::JsonOutput;
use notify::LogNotifier;
use session::{DrillView, SessionController};

#[derive(Parser)]
#[command(name = "hanon")]
#[command(about = "Sentence-transformation drills, one session at a time")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the progress database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Drill data: a CSV file path or an http(s) URL
    #[arg(long, short, global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Show the current drill
    Show,

    /// Show the current drill with its answer
    Reveal,

    /// Advance to the next drill
    Next,

    /// List all sessions
    Sessions,

    /// Jump to the start of a session
    Select {
        /// Session (group) ID
        group_id: String,
    },

    /// Show progress statistics
    Stats,

    /// Forget all progress
    Reset,

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Debug, serde::Serialize)]
struct SessionRow {
    position: usize,
    id: String,
    title: String,
    steps: usize,
    current: bool,
}

fn open_db(config: &Config) -> Result<Database, AppError> {
    let db = Database::open(&config.db_path)?;
    db.init()?;
    Ok(db)
}

fn open_controller(config: &Config) -> Result<SessionController<Database, LogNotifier>, AppError> {
    let db = open_db(config)?;
    let store = source::load_store(&db, &config.source)?;
    Ok(SessionController::new(store, db, LogNotifier)?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        match serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
            Ok(out) if json => println!("{}", out),
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env(cli.db, cli.source);

    match cli.command {
        Commands::Init => {
            open_db(&config)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", config.db_path.display());
            }
        }

        Commands::Show => {
            let controller = open_controller(&config)?;
            print_view(&controller.current_view(), cli.json)?;
        }

        Commands::Reveal => {
            let mut controller = open_controller(&config)?;
            controller.reveal_answer();
            print_view(&controller.current_view(), cli.json)?;
        }

        Commands::Next => {
            let mut controller = open_controller(&config)?;
            let before = controller.progress().total_sessions_completed;
            controller.advance()?;
            let view = controller.current_view();
            if !cli.json && view.total_sessions > before {
                println!("Session complete! ({} total)", view.total_sessions);
                println!();
            }
            print_view(&view, cli.json)?;
        }

        Commands::Sessions => {
            let controller = open_controller(&config)?;
            let current = controller.progress().current_group_id.clone();
            let rows: Vec<SessionRow> = controller
                .groups()
                .into_iter()
                .enumerate()
                .map(|(i, g)| SessionRow {
                    position: i + 1,
                    steps: controller.steps_in(&g.id),
                    current: current.as_deref() == Some(g.id.as_str()),
                    id: g.id,
                    title: g.title,
                })
                .collect();

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&rows))?);
            } else {
                println!("  {:<5} {:<10} {:<40} STEPS", "#", "ID", "TITLE");
                println!("{}", "-".repeat(66));
                for row in rows {
                    println!(
                        "{} {:<5} {:<10} {:<40} {}",
                        if row.current { ">" } else { " " },
                        row.position,
                        truncate(&row.id, 10),
                        truncate(&row.title, 38),
                        row.steps
                    );
                }
            }
        }

        Commands::Select { group_id } => {
            let mut controller = open_controller(&config)?;
            controller.select_group(&group_id)?;
            print_view(&controller.current_view(), cli.json)?;
        }

        Commands::Stats => {
            let controller = open_controller(&config)?;
            let view = controller.current_view();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "total_sessions": view.total_sessions,
                        "current_session": view.group,
                        "session_position": view.group_position,
                        "session_count": view.group_count,
                        "step_position": view.step_position,
                        "step_count": view.step_count
                    })))?
                );
            } else {
                println!("=== Practice Statistics ===");
                println!("Sessions completed: {}", view.total_sessions);
                if let Some(group) = &view.group {
                    println!("Current session: {}", group.title);
                }
                println!("Session: {} / {}", view.group_position, view.group_count);
                println!("Step: {} / {}", view.step_position, view.step_count);
            }
        }

        Commands::Reset => {
            let db = open_db(&config)?;
            let cleared = db.clear_progress()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(cleared))?);
            } else if cleared {
                println!("Progress reset.");
            } else {
                println!("No saved progress.");
            }
        }

        Commands::Tui => {
            let db = open_db(&config)?;
            tui::run(db, config.source)?;
        }
    }

    Ok(())
}

fn print_view(view: &DrillView, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&JsonOutput::ok(view))?);
        return Ok(());
    }

    let title = view
        .group
        .as_ref()
        .map(|g| g.title.as_str())
        .unwrap_or("-");
    println!(
        "=== {} ({} / {}) - step {} of {} ===",
        title, view.group_position, view.group_count, view.step_position, view.step_count
    );
    println!();

    match &view.item {
        Some(item) => {
            println!("{}", item.prompt_primary);
            if !item.prompt_secondary.is_empty() {
                println!("{}", item.prompt_secondary);
            }
            println!();
            println!("> {}", item.instruction);
            if view.answer_revealed {
                println!();
                println!("Answer: {}", item.answer);
            }
        }
        None => println!("No data available"),
    }

    println!();
    println!("Sessions completed: {}", view.total_sessions);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("過去形の練習問題", 6), "過去形...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["hanon", "init"]).unwrap();
            assert!(!cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_show_with_json() {
            let cli = Cli::try_parse_from(["hanon", "--json", "show"]).unwrap();
            assert!(cli.json);
            assert!(matches!(cli.command, Commands::Show));
        }

        #[test]
        fn parse_next_and_reveal() {
            let cli = Cli::try_parse_from(["hanon", "next"]).unwrap();
            assert!(matches!(cli.command, Commands::Next));
            let cli = Cli::try_parse_from(["hanon", "reveal"]).unwrap();
            assert!(matches!(cli.command, Commands::Reveal));
        }

        #[test]
        fn parse_select() {
            let cli = Cli::try_parse_from(["hanon", "select", "12"]).unwrap();
            match cli.command {
                Commands::Select { group_id } => assert_eq!(group_id, "12"),
                _ => panic!("Expected Select command"),
            }
        }

        #[test]
        fn parse_select_requires_group() {
            assert!(Cli::try_parse_from(["hanon", "select"]).is_err());
        }

        #[test]
        fn parse_global_paths() {
            let cli = Cli::try_parse_from([
                "hanon",
                "sessions",
                "--db",
                "/tmp/h.db",
                "-s",
                "https://example.com/q.csv",
            ])
            .unwrap();
            assert!(matches!(cli.command, Commands::Sessions));
            assert_eq!(cli.db, Some(PathBuf::from("/tmp/h.db")));
            assert_eq!(cli.source, Some("https://example.com/q.csv".to_string()));
        }

        #[test]
        fn parse_json_flag_global() {
            let cli = Cli::try_parse_from(["hanon", "stats", "--json"]).unwrap();
            assert!(cli.json);
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["hanon", "invalid"]).is_err());
        }
    }

    mod command_tests {
        use super::*;
        use std::fs;

        const CSV: &str = "\
group_id,step_no,base_en,base_ja,instruction,answer_en,group_title
1,1,I eat.,食べる。,Past tense,I ate.,Basics
2,1,She runs.,走る。,Negate,She does not run.,
";

        fn config(dir: &tempfile::TempDir) -> Config {
            let csv = dir.path().join("questions.csv");
            fs::write(&csv, CSV).unwrap();
            Config::from_env(
                Some(dir.path().join("hanon.db")),
                Some(csv.display().to_string()),
            )
        }

        #[test]
        fn next_progress_survives_reopen() {
            let dir = tempfile::tempdir().unwrap();
            let config = config(&dir);

            let mut controller = open_controller(&config).unwrap();
            controller.advance().unwrap();
            drop(controller);

            let controller = open_controller(&config).unwrap();
            assert_eq!(controller.progress().current_group_id, Some("2".to_string()));
            assert_eq!(controller.progress().total_sessions_completed, 1);
        }

        #[test]
        fn offline_run_uses_cached_data() {
            let dir = tempfile::tempdir().unwrap();
            let config = config(&dir);
            open_controller(&config).unwrap();

            fs::remove_file(dir.path().join("questions.csv")).unwrap();

            let controller = open_controller(&config).unwrap();
            assert_eq!(controller.groups().len(), 2);
        }

        #[test]
        fn missing_source_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let config = Config::from_env(
                Some(dir.path().join("hanon.db")),
                Some(dir.path().join("missing.csv").display().to_string()),
            );
            assert!(matches!(open_controller(&config), Err(AppError::Source(_))));
        }
    }
}
