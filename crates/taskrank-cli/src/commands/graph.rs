use std::path::PathBuf;

use clap::Args;
use taskrank_core::api::{self, GraphRequest};

use crate::input;

#[derive(Args)]
pub struct GraphArgs {
    /// JSON file with `{tasks}` or a task array (stdin if omitted)
    pub file: Option<PathBuf>,
}

pub fn run(args: GraphArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = input::read_source(args.file.as_deref())?;
    let request = input::parse_batch(&source)?;
    let response = api::dependency_graph(GraphRequest {
        tasks: request.tasks,
    });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
