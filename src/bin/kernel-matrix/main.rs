//! kernel-matrix CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use kernel_matrix::util::diagnostic::emit;
use kernel_matrix::MatrixError;

fn main() {
    let cli = Cli::parse();

    let color = cli.color.use_color_for(&std::io::stderr());

    if let Err(e) = run(cli) {
        match e.downcast_ref::<MatrixError>() {
            Some(err) => emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging; stdout is reserved for the build report
    let filter = if cli.verbose {
        EnvFilter::new("kernel_matrix=debug")
    } else {
        EnvFilter::new("kernel_matrix=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.color),
        Commands::List(args) => commands::list::execute(args),
        Commands::UpdateRecipe(args) => commands::update_recipe::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
