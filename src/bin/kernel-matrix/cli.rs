//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use kernel_matrix::core::{KernelVersion, DEFAULT_BUILD_SET};
use kernel_matrix::util::ColorChoice;

/// kernel-matrix - kernel recipe generation and build matrix testing for kas layers
#[derive(Parser)]
#[command(name = "kernel-matrix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every combination of a build set
    Build(BuildArgs),

    /// List build sets, or the builds of one set
    List(ListArgs),

    /// Refresh kernel recipes from kernel.org
    UpdateRecipe(UpdateRecipeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build set to run
    #[arg(short, long, default_value = DEFAULT_BUILD_SET)]
    pub buildset: String,

    /// Site configuration appended to every build's config list
    #[arg(short, long, env = "KERNEL_MATRIX_SITECONF")]
    pub siteconf: Option<PathBuf>,

    /// Work directory for builds, logs and caches (defaults to current directory)
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Build set to expand (lists all build sets if omitted)
    pub buildset: Option<String>,

    /// Work directory whose configuration is read (defaults to current directory)
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct UpdateRecipeArgs {
    /// Kernel series to refresh, e.g. 5.10 (defaults to every series in the build sets)
    pub series: Vec<KernelVersion>,

    /// Layer root to write recipes under (defaults to current directory)
    #[arg(long)]
    pub layer_dir: Option<PathBuf>,

    /// Resolve versions without writing any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
