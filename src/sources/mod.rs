//! Remote kernel metadata sources.
//!
//! Sources answer the two questions a recipe refresh needs: which releases
//! of a major version exist (with their checksums), and which commit a
//! release tag points at.

pub mod kernel_org;

use anyhow::Result;

pub use kernel_org::KernelOrg;

/// A source of kernel release metadata.
pub trait KernelMetadata {
    /// Fetch the checksum listing covering every release of `major`.
    fn checksum_listing(&self, major: u32) -> Result<String>;

    /// Look up the commit hash an exact tag points at, if the tag exists.
    fn tag_revision(&self, tag: &str) -> Result<Option<String>>;

    /// Where tags are looked up, for error messages.
    fn tag_source(&self) -> String;
}
