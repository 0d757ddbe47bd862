//! Implementation of `kernel-matrix build`.
//!
//! Units run one at a time in build set order. A unit that fails, for any
//! reason, is recorded and the run moves on to the next one.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::core::{BuildSet, BuildUnit};
use crate::util::config::Config;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Mark, Shell};

/// How every unit of a run invokes the build tool.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Build tool program
    pub tool: PathBuf,

    /// First config file of every build
    pub toplevel_config: String,

    /// Site configuration appended after the unit's own configs
    pub siteconf: Option<PathBuf>,
}

impl RunOptions {
    pub fn from_config(config: &Config, siteconf: Option<PathBuf>) -> Self {
        RunOptions {
            tool: PathBuf::from(config.tool()),
            toplevel_config: config.toplevel_config().to_string(),
            siteconf,
        }
    }

    fn command(&self, unit: &BuildUnit) -> ProcessBuilder {
        let configs = unit.config_arg(&self.toplevel_config, self.siteconf.as_deref());
        unit.env_overrides()
            .into_iter()
            .fold(
                ProcessBuilder::new(&self.tool).arg("build").arg(configs),
                |pb, (key, value)| pb.env(key, value),
            )
    }
}

/// What happened to a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Skipped,
    Succeeded,
    /// The diagnostic is the same text appended to the unit's log.
    Failed { diagnostic: String },
}

/// Outcome of one unit plus its wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub outcome: BuildOutcome,
    pub elapsed: Duration,
}

impl BuildResult {
    /// Skipped units count as successful.
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, BuildOutcome::Failed { .. })
    }
}

/// Results of a whole build set, in run order.
#[derive(Debug, Default)]
pub struct MatrixReport {
    pub results: Vec<(BuildUnit, BuildResult)>,
}

impl MatrixReport {
    /// True iff no unit failed.
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BuildUnit> {
        self.results
            .iter()
            .filter(|(_, r)| !r.succeeded())
            .map(|(u, _)| u)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Run one unit and report its outcome on `shell`.
///
/// The label is printed before any work. Errors are only returned when the
/// report itself cannot be written; build failures are part of the result.
pub fn run_unit<W: Write>(
    unit: &BuildUnit,
    opts: &RunOptions,
    shell: &mut Shell<W>,
) -> Result<BuildResult> {
    shell.print(format_args!("{} ", unit))?;

    if unit.should_skip() {
        shell.finish_unit(Mark::Skipped, Duration::ZERO)?;
        return Ok(BuildResult {
            outcome: BuildOutcome::Skipped,
            elapsed: Duration::ZERO,
        });
    }

    let start = Instant::now();
    let outcome = attempt(unit, opts);
    let elapsed = start.elapsed();

    let mark = match outcome {
        BuildOutcome::Failed { .. } => Mark::Fail,
        _ => Mark::Pass,
    };
    shell.finish_unit(mark, elapsed)?;

    Ok(BuildResult { outcome, elapsed })
}

/// Run every unit of `set` in order, then print the verdict.
pub fn run_set<W: Write>(
    set: &BuildSet,
    opts: &RunOptions,
    shell: &mut Shell<W>,
) -> Result<MatrixReport> {
    let count = set.size();
    shell.println(format_args!("Build set `{}`: {} builds", set.name(), count))?;

    let mut report = MatrixReport::default();
    for (i, unit) in set.units().enumerate() {
        shell.print(format_args!("[{:03}/{:03}] ", i + 1, count))?;
        let result = run_unit(&unit, opts, shell)?;
        report.results.push((unit, result));
    }

    if report.succeeded() {
        shell.println("All succeeded.")?;
    } else {
        shell.println("Failed!")?;
    }

    Ok(report)
}

/// Clean, invoke, and record one unit. The log is closed when this returns.
fn attempt(unit: &BuildUnit, opts: &RunOptions) -> BuildOutcome {
    let mut log = match open_log(unit) {
        Ok(log) => log,
        Err(e) => {
            // No log to write to; stderr is the only record left.
            tracing::error!("{} {} {}: {:#}", unit.release(), unit.machine(), unit.kernel(), e);
            return BuildOutcome::Failed {
                diagnostic: format!("error: {:?}", e),
            };
        }
    };

    let pb = opts.command(unit);
    let status = prepare(unit).and_then(|()| {
        tracing::debug!("running `{}`", pb.display_command());
        pb.status_to_log(&log)
    });

    let diagnostic = match status {
        Ok(status) if status.success() => return BuildOutcome::Succeeded,
        Ok(status) => exit_diagnostic(&pb, status),
        Err(e) => format!("error: {:?}", e),
    };

    if let Err(e) = writeln!(log, "\n{}", diagnostic) {
        tracing::warn!(
            "failed to write error record to {}: {}",
            unit.logpath().display(),
            e
        );
    }

    BuildOutcome::Failed { diagnostic }
}

/// Create the log directory and a fresh, truncated log.
fn open_log(unit: &BuildUnit) -> Result<File> {
    ensure_dir(&unit.logdir())?;

    let logpath = unit.logpath();
    File::create(&logpath)
        .with_context(|| format!("failed to create log file: {}", logpath.display()))
}

/// Wipe the previous build and create the shared cache directories.
fn prepare(unit: &BuildUnit) -> Result<()> {
    remove_dir_all_if_exists(&unit.builddir())?;
    ensure_dir(&unit.download_dir())?;
    ensure_dir(&unit.sstate_dir())
}

fn exit_diagnostic(pb: &ProcessBuilder, status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("error: `{}` failed with exit code {}", pb.display_command(), code),
        None => format!("error: `{}` terminated by {}", pb.display_command(), status),
    }
}
