//! kernel.org metadata: checksum listings and stable release tags.

use anyhow::{Context, Result};
use git2::{Direction, Remote};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::core::errors::ResolveError;
use crate::core::kernel::KernelVersion;
use crate::sources::KernelMetadata;

/// A `<sha256>  <filename>` line of a checksum listing.
static CHECKSUM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{64})\s+(\S+)$").unwrap());

/// Metadata served by kernel.org (or a mirror with the same layout).
pub struct KernelOrg {
    /// Root of the download tree, e.g. `https://cdn.kernel.org/pub/linux/kernel`
    cdn_url: Url,

    /// Stable kernel git repository
    git_url: Url,
}

impl KernelOrg {
    pub fn new(cdn_url: Url, git_url: Url) -> Self {
        KernelOrg { cdn_url, git_url }
    }

    /// URL of the checksum listing for a major version.
    pub fn listing_url(&self, major: u32) -> String {
        format!(
            "{}/v{}.x/sha256sums.asc",
            self.cdn_url.as_str().trim_end_matches('/'),
            major
        )
    }
}

impl KernelMetadata for KernelOrg {
    fn checksum_listing(&self, major: u32) -> Result<String> {
        let url = self.listing_url(major);
        tracing::info!("Fetching {}", url);

        let response = reqwest::blocking::get(&url)
            .with_context(|| format!("failed to download {}", url))?;

        if !response.status().is_success() {
            return Err(ResolveError::Http {
                url,
                status: response.status().as_u16(),
            }
            .into());
        }

        response
            .text()
            .with_context(|| format!("failed to read response body from {}", url))
    }

    fn tag_revision(&self, tag: &str) -> Result<Option<String>> {
        tracing::info!("Looking up {} in {}", tag, self.git_url);

        let mut remote = Remote::create_detached(self.git_url.as_str())
            .with_context(|| format!("invalid git remote: {}", self.git_url))?;
        remote
            .connect(Direction::Fetch)
            .with_context(|| format!("failed to connect to {}", self.git_url))?;

        let heads = remote
            .list()
            .with_context(|| format!("failed to list references of {}", self.git_url))?
            .iter()
            .map(|h| (h.name().to_string(), h.oid().to_string()))
            .collect::<Vec<_>>();

        Ok(select_tag_revision(&heads, tag))
    }

    fn tag_source(&self) -> String {
        self.git_url.to_string()
    }
}

/// Parse a checksum listing into `(sha256, filename)` pairs.
///
/// Lines that are not checksum entries (PGP armor, blank lines) are ignored.
pub fn parse_checksums(listing: &str) -> Vec<(&str, &str)> {
    listing
        .lines()
        .filter_map(|line| {
            let caps = CHECKSUM_LINE.captures(line.trim())?;
            Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
        })
        .collect()
}

/// The newest release of `series` named by a changelog entry in the listing.
///
/// Changelogs are published as `ChangeLog-<series>` for the first release of
/// a series and `ChangeLog-<series>.<n>` for point releases.
pub fn newest_release(checksums: &[(&str, &str)], series: &KernelVersion) -> Option<KernelVersion> {
    checksums
        .iter()
        .filter_map(|(_, name)| name.strip_prefix("ChangeLog-"))
        .filter_map(KernelVersion::parse)
        .filter(|v| v.belongs_to(series))
        .max()
}

/// The checksum of the `.tar.xz` archive of `version`.
pub fn archive_checksum<'a>(checksums: &[(&'a str, &str)], version: &KernelVersion) -> Option<&'a str> {
    let archive = archive_name(version);
    checksums
        .iter()
        .find(|(_, name)| *name == archive)
        .map(|(sha, _)| *sha)
}

pub fn archive_name(version: &KernelVersion) -> String {
    format!("linux-{}.tar.xz", version)
}

/// Pick the commit a tag points at from `(refname, oid)` pairs.
///
/// Annotated tags are advertised twice; the peeled `^{}` entry is the commit.
pub fn select_tag_revision(heads: &[(String, String)], tag: &str) -> Option<String> {
    let exact = format!("refs/tags/{}", tag);
    let peeled = format!("{}^{{}}", exact);

    heads
        .iter()
        .find(|(name, _)| *name == peeled)
        .or_else(|| heads.iter().find(|(name, _)| *name == exact))
        .map(|(_, oid)| oid.clone())
}
