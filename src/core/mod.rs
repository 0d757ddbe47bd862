//! Core data structures.
//!
//! - Kernel tags (flavors and numeric series)
//! - Build units and the paths they own
//! - Build sets and the named registry
//! - Typed errors

pub mod buildset;
pub mod errors;
pub mod kernel;
pub mod unit;

pub use buildset::{BuildSet, BuildSetRegistry, DEFAULT_BUILD_SET};
pub use errors::{MatrixError, ResolveError};
pub use kernel::{Flavor, KernelTag, KernelVersion};
pub use unit::BuildUnit;
