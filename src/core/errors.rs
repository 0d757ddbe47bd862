//! Build matrix error types and diagnostics.

use thiserror::Error;

use crate::core::buildset::RESERVED_NAME_CHARS;
use crate::util::diagnostic::Diagnostic;

/// Error while selecting or running a build matrix.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("unknown build set `{name}`")]
    UnknownBuildSet { name: String, available: Vec<String> },

    #[error("malformed kernel tag `{tag}`")]
    MalformedKernelTag { tag: String },

    #[error("build set `{name}` has no {axis}")]
    EmptyBuildSet { name: String, axis: &'static str },

    #[error("build set `{name}` has invalid {axis} entry `{value}`")]
    InvalidAxisEntry {
        name: String,
        axis: &'static str,
        value: String,
    },

    #[error("{failed} of {total} builds failed")]
    BuildsFailed { failed: usize, total: usize },
}

impl MatrixError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            MatrixError::UnknownBuildSet { name, available } => {
                let mut diag = Diagnostic::error(format!("unknown build set `{}`", name));

                if !available.is_empty() {
                    diag = diag.with_context(format!("available build sets: {}", available.join(", ")));
                }

                diag.with_suggestion("Run `kernel-matrix list` to see every build set")
                    .with_suggestion(format!(
                        "Declare `[buildsets.{}]` in .kernel-matrix/config.toml",
                        name
                    ))
            }

            MatrixError::MalformedKernelTag { tag } => Diagnostic::error(format!(
                "kernel tag `{}` is neither a flavor nor a dotted version",
                tag
            ))
            .with_context("flavors are: lts, stable, mainline")
            .with_suggestion("Use a numeric series such as `5.10`"),

            MatrixError::EmptyBuildSet { name, axis } => {
                Diagnostic::error(format!("build set `{}` has no {}", name, axis))
                    .with_suggestion(format!("List at least one entry under `{}`", axis))
            }

            MatrixError::InvalidAxisEntry { name, axis, value } => Diagnostic::error(format!(
                "build set `{}` has invalid {} entry `{}`",
                name, axis, value
            ))
            .with_context("release and machine names become part of build and log paths")
            .with_suggestion(format!(
                "Use a non-empty name without {} in `{}`",
                RESERVED_NAME_CHARS
                    .iter()
                    .map(|c| format!("`{}`", c))
                    .collect::<Vec<_>>()
                    .join(" "),
                axis
            )),

            MatrixError::BuildsFailed { failed, total } => {
                Diagnostic::error(format!("{} of {} builds failed", failed, total))
                    .with_suggestion("Inspect the per-build logs under <workdir>/logs")
            }
        }
    }
}

/// Error while resolving kernel release metadata.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no release of series {series} in the checksum listing")]
    NoRelease { series: String },

    #[error("no checksum for `{archive}` in the checksum listing")]
    MissingArchiveChecksum { archive: String },

    #[error("tag `{tag}` not found in {url}")]
    TagNotFound { tag: String, url: String },

    #[error("failed to download {url}: HTTP {status}")]
    Http { url: String, status: u16 },
}
