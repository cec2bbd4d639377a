use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quay_config::{ConfigStore, Env, LogLevel};
use quay_core::Status;
use quay_project::{merge, Scanner};

#[derive(Parser)]
#[command(name = "quay", version, about = "Quay CLI (project scanning, git activity)")]
struct Cli {
    /// Scan root (defaults to CODE_BASE_PATH)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the tree and print the merged project list
    Scan(ScanArgs),
    /// Recent commits across every git-backed project
    Commits(CommitsArgs),
    /// Per-day added/removed line totals
    Velocity(VelocityArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Only projects in this status bucket
    #[arg(long)]
    status: Option<Status>,
    /// Substring filter over name, description, and tech stack
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct CommitsArgs {
    /// Total commits to print
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=500))]
    limit: u32,
}

#[derive(Args)]
struct VelocityArgs {
    /// Days of history to aggregate
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=365))]
    days: u32,
}

/// Commits each repository contributes before the global sort and cut.
const COMMITS_PER_PROJECT: usize = 50;

fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|text| text.parse::<LogLevel>().ok())
        .unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    let env = Env::from_env().context("no --root given and the environment is not usable")?;
    Ok(env.code_base_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let root = resolve_root(cli.root)?;
    let scanner = Scanner::new(&root);

    match cli.command {
        Command::Scan(args) => {
            let store = ConfigStore::new(&root);
            let projects = scanner.scan_all().await;
            let config = store.read().await;

            let mut merged = merge::apply_overrides(projects, &config);
            let counts = merge::status_counts(&merged);

            if let Some(status) = args.status {
                merged.retain(|p| p.status == status);
            }
            if let Some(search) = &args.search {
                let query = search.to_lowercase();
                merged.retain(|p| merge::matches_search(p, &query));
            }
            merge::sort_for_display(&mut merged);

            print_json(&serde_json::json!({ "projects": merged, "counts": counts }))
        }
        Command::Commits(args) => {
            let projects = scanner.scan_all().await;
            let mut commits =
                quay_activity::collect_recent_commits(&projects, COMMITS_PER_PROJECT).await;
            commits.truncate(args.limit as usize);

            print_json(&serde_json::json!({ "commits": commits }))
        }
        Command::Velocity(args) => {
            let projects = scanner.scan_all().await;
            let totals = quay_activity::collect_velocity(&projects, args.days).await;

            let data: Vec<serde_json::Value> = totals
                .into_iter()
                .map(|(date, stat)| {
                    serde_json::json!({
                        "date": date,
                        "linesAdded": stat.lines_added,
                        "linesRemoved": stat.lines_removed,
                    })
                })
                .collect();

            print_json(&serde_json::json!({ "data": data }))
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
