//! `kernel-matrix build` command

use anyhow::{Context, Result};

use crate::cli::BuildArgs;
use kernel_matrix::ops::{run_set, RunOptions};
use kernel_matrix::util::diagnostic::{emit, Diagnostic};
use kernel_matrix::util::process::find_executable;
use kernel_matrix::util::{ColorChoice, GlobalContext, Shell};
use kernel_matrix::MatrixError;

pub fn execute(args: BuildArgs, color: ColorChoice) -> Result<()> {
    let ctx = GlobalContext::new(args.workdir.as_deref())?;
    let registry = ctx.registry()?;

    // Unknown names fail here, before anything is built
    let set = registry
        .get(&args.buildset)?
        .clone()
        .with_workdir(ctx.workdir());

    let siteconf = args
        .siteconf
        .map(|p| {
            p.canonicalize()
                .with_context(|| format!("invalid site configuration: {}", p.display()))
        })
        .transpose()?;

    let opts = RunOptions::from_config(ctx.config(), siteconf);

    if find_executable(&opts.tool.to_string_lossy()).is_none() {
        emit(
            &Diagnostic::warning(format!("build tool `{}` not found", opts.tool.display()))
                .with_context("every build will fail to start")
                .with_suggestion("Install kas, or set `build.tool` in .kernel-matrix/config.toml")
                .with_location(ctx.project_config_path()),
            color.use_color_for(&std::io::stderr()),
        );
    }

    let mut shell = Shell::stdout(color);
    let report = run_set(&set, &opts, &mut shell)?;

    if !report.succeeded() {
        for unit in report.failed() {
            tracing::info!("log for {}: {}", unit, unit.logpath().display());
        }
        return Err(MatrixError::BuildsFailed {
            failed: report.failed().count(),
            total: report.total(),
        }
        .into());
    }

    Ok(())
}
