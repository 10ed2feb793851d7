mod cli;

use std::path::Path;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::warn;

use cli::{Cli, Commands};
use code_context::planning::build_instruction;
use code_context::query::{context::assemble_context, top_nodes};
use code_context::{CodeContextConfig, ProjectSession, build_graph, logging, output};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            path,
            verbose,
            json,
            graph,
        } => {
            let config = load_config(&path)?;
            let (store, stats) =
                tokio::task::spawn_blocking(move || build_graph(&path, &config, verbose)).await?;
            if graph {
                println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
            } else {
                output::print_summary(&stats, json);
            }
        }
        Commands::Context { prompt, path } => {
            println!("{}", one_shot_context(&path, &prompt).await?);
        }
        Commands::Instruction { prompt, path } => {
            let context = one_shot_context(&path, &prompt).await?;
            print!("{}", build_instruction(&context, &prompt));
        }
        Commands::Watch { path } => {
            let config = load_config(&path)?;
            let session = ProjectSession::with_config(config);
            if let Some(stats) = session.start_indexing(&path).await? {
                output::print_summary(&stats, false);
            }
            eprintln!("Watching {} (Ctrl-C to stop)...", path.display());
            tokio::signal::ctrl_c().await?;
            session.stop_indexing().await;
            let snapshot = session.graph().await;
            eprintln!(
                "Stopped. Graph holds {} nodes, {} edges.",
                snapshot.nodes.len(),
                snapshot.edges.len()
            );
        }
    }

    Ok(())
}

/// Validate the project root, load its config, and set up logging from it.
fn load_config(path: &Path) -> Result<CodeContextConfig> {
    if !path.is_dir() {
        bail!("project root {} is not a directory", path.display());
    }
    let (config, problem) = CodeContextConfig::load_reporting(path);
    logging::init_with_config(&config.logging);
    if let Some(problem) = problem {
        warn!("{problem}");
    }
    Ok(config)
}

async fn one_shot_context(path: &Path, prompt: &str) -> Result<String> {
    let config = load_config(path)?;
    let max_bytes = config.context.max_bytes;
    let root = path.to_path_buf();
    let (store, _) = tokio::task::spawn_blocking(move || build_graph(&root, &config, false)).await?;
    let nodes = top_nodes(&store, prompt);
    Ok(assemble_context(&nodes, max_bytes).await)
}
