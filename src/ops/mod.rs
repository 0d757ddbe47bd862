//! High-level operations.
//!
//! This module contains the implementation of kernel-matrix commands.

pub mod matrix_list;
pub mod matrix_run;
pub mod recipe_update;

pub use matrix_list::{plan, summarize, BuildSetSummary, UnitPlan};
pub use matrix_run::{run_set, run_unit, BuildOutcome, BuildResult, MatrixReport, RunOptions};
pub use recipe_update::{registry_series, update_recipes, ResolvedKernel, UpdateOptions};
