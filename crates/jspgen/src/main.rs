use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use jsp_tree::{BuildConfig, DEFAULT_MAX_LEAF_TRIANGLES, Jsp, MAX_BSP_DEPTH, Platform, rw};
use tracing_subscriber::EnvFilter;

/// Builds a collision BSP (.jsp) from a RenderWare clump (.dff)
#[derive(Parser)]
#[clap(name = "jspgen", version)]
struct Params {
    /// Target platform: gc, ps2 or xbox
    #[clap(short, long)]
    platform: Platform,

    /// Input clump
    input: PathBuf,

    /// Output file. Overwritten if it exists
    output: PathBuf,

    /// Sides with this many triangles or fewer become leaves
    #[clap(long, default_value_t = DEFAULT_MAX_LEAF_TRIANGLES)]
    max_leaf_triangles: usize,

    /// Recursion depth cap (1 to 32)
    #[clap(long, default_value_t = MAX_BSP_DEPTH)]
    max_depth: u32,

    /// Log every partition step
    #[clap(short, long)]
    verbose: bool,
}

fn run(params: &Params) -> anyhow::Result<()> {
    let config = BuildConfig {
        max_leaf_triangles: params.max_leaf_triangles,
        max_depth: params.max_depth,
    };

    let scene = rw::read_clump_file(&params.input)
        .with_context(|| format!("failed to read clump from {}", params.input.display()))?;

    let (jsp, stats) = Jsp::build(&scene, &config).context("failed to build collision tree")?;

    tracing::info!(
        platform = %params.platform,
        triangles = jsp.tree.triangles().len(),
        branch_nodes = jsp.tree.branch_nodes().len(),
        max_depth = stats.max_depth_reached,
        forced_leaves = stats.forced_leaves,
        "built jsp"
    );

    jsp.write_to_path(&params.output, params.platform)
        .with_context(|| format!("failed to write {}", params.output.display()))?;

    Ok(())
}

fn main() -> ExitCode {
    let params = Params::parse();

    let default_level = if params.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
