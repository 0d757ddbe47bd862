//! kernel-matrix - kernel recipe generation and build matrix testing for kas layers
//!
//! This crate provides the library behind the `kernel-matrix` binary:
//! named build matrices, the sequential matrix runner, and the kernel.org
//! metadata resolver used to refresh kernel recipes.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

pub use core::{BuildSet, BuildSetRegistry, BuildUnit, KernelTag, MatrixError};
pub use util::context::GlobalContext;
