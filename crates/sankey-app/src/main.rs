use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ron::ser::PrettyConfig;
use sankey_layout::{FlowGraph, Frame, GraphDescription, LayoutResult, SankeyLayout};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Lay out a Sankey diagram and print its geometry as RON
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Graph description (RON)
    graph: PathBuf,

    /// Layout settings (RON), missing fields take their default value
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 0.0)]
    top: f64,

    #[arg(long, default_value_t = 0.0)]
    left: f64,

    #[arg(long, default_value_t = 500.0)]
    width: f64,

    #[arg(long, default_value_t = 500.0)]
    height: f64,
}

impl Args {
    fn frame(&self) -> Frame {
        Frame::new(self.top, self.left, self.width, self.height)
    }
}

fn load_graph(path: &Path) -> Result<FlowGraph> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph {}", path.display()))?;
    let description: GraphDescription = ron::from_str(&text)
        .with_context(|| format!("Failed to parse graph {}", path.display()))?;
    FlowGraph::try_from(description).with_context(|| format!("Invalid graph {}", path.display()))
}

fn load_settings(path: Option<&Path>) -> Result<SankeyLayout> {
    let Some(path) = path else {
        return Ok(SankeyLayout::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("Failed to parse settings {}", path.display()))
}

fn run(args: &Args) -> Result<LayoutResult> {
    let graph = load_graph(&args.graph)?;
    let settings = load_settings(args.config.as_deref())?;
    debug!("Settings: {settings:?}");

    let result = settings
        .layout(&graph, args.frame())
        .context("Failed to lay out the graph")?;
    info!(
        "Laid out {} node(s) and {} link(s), ratio {}",
        result.nodes.len(),
        result.links.len(),
        result.ratio
    );

    Ok(result)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let result = run(&args)?;
    let output = ron::ser::to_string_pretty(&result, PrettyConfig::default())
        .context("Failed to serialize the layout")?;
    println!("{output}");

    Ok(())
}
