use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod input;
mod logging;
mod server;

#[derive(Parser)]
#[command(name = "taskrank", version, about = "Rank tasks by urgency, importance, effort and dependencies")]
struct Cli {
    /// Logging level; overrides TASKRANK_LOG and the configured level
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Date to score against instead of the local date (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and rank every task in a batch
    Analyze(commands::analyze::AnalyzeArgs),
    /// Show the top few tasks of a batch
    Suggest(commands::analyze::SuggestArgs),
    /// Print the dependency graph of a batch
    Graph(commands::graph::GraphArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the JSON-over-HTTP server
    Serve(commands::serve::ServeArgs),
}

fn main() {
    let cli = Cli::parse();
    let config = taskrank_core::Config::load_or_default();
    if let Err(e) = logging::init_logging(cli.log_level, &config.logging.level) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, &config, today),
        Commands::Suggest(args) => commands::analyze::run_suggest(args, &config, today),
        Commands::Graph(args) => commands::graph::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Serve(args) => commands::serve::run(args, config, cli.today),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
