use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use taskrank_core::api::{self, AnalyzeRequest};
use taskrank_core::{Config, ScoredTask};

use crate::input;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// JSON file with `{tasks, strategy?}` or a task array (stdin if omitted)
    pub file: Option<PathBuf>,
    /// smart_balance, fastest_wins, high_impact or deadline_driven
    #[arg(long, short)]
    pub strategy: Option<String>,
    /// Print the JSON response instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// JSON file with `{tasks, strategy?}` or a task array (stdin if omitted)
    pub file: Option<PathBuf>,
    #[arg(long, short)]
    pub strategy: Option<String>,
    /// How many tasks to suggest (defaults to `scoring.suggest_count`)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
    #[arg(long)]
    pub json: bool,
}

fn load_request(
    file: Option<&PathBuf>,
    strategy: Option<String>,
) -> Result<AnalyzeRequest, Box<dyn std::error::Error>> {
    let source = input::read_source(file.map(PathBuf::as_path))?;
    let mut request = input::parse_batch(&source)?;
    if strategy.is_some() {
        request.strategy = strategy;
    }
    Ok(request)
}

pub fn run_analyze(
    args: AnalyzeArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = load_request(args.file.as_ref(), args.strategy)?;
    let response = api::analyze(request, today, config.scoring.default_strategy)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    if let Some(warning) = &response.warning {
        eprintln!("{warning}");
    }
    println!("Strategy: {} ({} tasks)", response.strategy.label(), response.count);
    print_table(&response.tasks);
    Ok(())
}

pub fn run_suggest(
    args: SuggestArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = args.count.unwrap_or(config.scoring.suggest_count);
    if count == 0 {
        return Err("--count must be at least 1".into());
    }
    let request = load_request(args.file.as_ref(), args.strategy)?;
    let response = api::suggest(request, today, config.scoring.default_strategy, count)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    println!("Top {} by {}:", response.count, response.strategy.label());
    print_table(&response.suggestions);
    Ok(())
}

fn print_table(tasks: &[ScoredTask]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    println!("{:>4}  {:>6}  {:>8}  {:<30}  WHY", "RANK", "ID", "SCORE", "TITLE");
    for (rank, entry) in tasks.iter().enumerate() {
        println!(
            "{:>4}  {:>6}  {:>8.2}  {:<30}  {}",
            rank + 1,
            entry.task.id,
            entry.priority_score,
            truncate(&entry.task.title, 30),
            entry.explanation
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
