//! Implementation of `kernel-matrix update-recipe`.
//!
//! For each kernel series, find its newest release, pin it to a commit and an
//! archive checksum, and write a recipe plus the kas include that selects it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::ResolveError;
use crate::core::kernel::KernelVersion;
use crate::core::BuildSetRegistry;
use crate::sources::kernel_org::{archive_checksum, archive_name, newest_release, parse_checksums};
use crate::sources::KernelMetadata;
use crate::util::fs::write_string;

const GENERATED_HEADER: &str = "# Generated by `kernel-matrix update-recipe`. Do not edit.\n";

/// Options for the update-recipe command.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Layer root the recipe and kas files are written under
    pub layer_dir: PathBuf,

    /// Resolve and print, but don't write anything
    pub dry_run: bool,
}

/// A kernel series pinned to an exact release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKernel {
    pub series: KernelVersion,
    pub version: KernelVersion,
    /// Commit the release tag points at
    pub revision: String,
    pub archive_sha256: String,
}

/// Files written for one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFiles {
    pub recipe: PathBuf,
    pub kas_include: PathBuf,
}

impl RecipeFiles {
    pub fn for_series(layer_dir: &Path, series: &KernelVersion) -> Self {
        RecipeFiles {
            recipe: layer_dir
                .join("recipes-kernel/linux")
                .join(format!("linux-stable_{}.bb", series)),
            kas_include: layer_dir.join("kas").join(format!("kernel-{}.yml", series)),
        }
    }
}

/// Resolve `series` from an already-fetched checksum listing.
pub fn resolve_kernel(
    meta: &dyn KernelMetadata,
    listing: &str,
    series: &KernelVersion,
) -> Result<ResolvedKernel> {
    let checksums = parse_checksums(listing);

    let version = newest_release(&checksums, series).ok_or_else(|| ResolveError::NoRelease {
        series: series.to_string(),
    })?;
    tracing::debug!("newest release of {} is {}", series, version);

    let archive_sha256 = archive_checksum(&checksums, &version)
        .ok_or_else(|| ResolveError::MissingArchiveChecksum {
            archive: archive_name(&version),
        })?
        .to_string();

    let tag = format!("v{}", version);
    let revision = meta
        .tag_revision(&tag)?
        .ok_or_else(|| ResolveError::TagNotFound {
            tag: tag.clone(),
            url: meta.tag_source(),
        })?;

    Ok(ResolvedKernel {
        series: series.clone(),
        version,
        revision,
        archive_sha256,
    })
}

pub fn render_recipe(kernel: &ResolvedKernel) -> String {
    format!(
        "{header}\n\
         LINUX_VERSION = \"{version}\"\n\
         LINUX_SERIES = \"{series}\"\n\
         LINUX_MAJOR = \"{major}\"\n\
         SRCREV = \"{rev}\"\n\
         SRC_URI[sha256sum] = \"{sha}\"\n\
         \n\
         require linux-stable.inc\n",
        header = GENERATED_HEADER,
        version = kernel.version,
        series = kernel.series,
        major = kernel.series.major(),
        rev = kernel.revision,
        sha = kernel.archive_sha256,
    )
}

pub fn render_kas_include(kernel: &ResolvedKernel) -> String {
    format!(
        "{header}\n\
         header:\n  \
           version: 14\n\
         \n\
         local_conf_header:\n  \
           kernel: |\n    \
             PREFERRED_PROVIDER_virtual/kernel = \"linux-stable\"\n    \
             PREFERRED_VERSION_linux-stable = \"{series}%\"\n",
        header = GENERATED_HEADER,
        series = kernel.series,
    )
}

/// Every numeric kernel series named by the registry, first occurrence first.
pub fn registry_series(registry: &BuildSetRegistry) -> Vec<KernelVersion> {
    let mut series: Vec<KernelVersion> = Vec::new();
    for set in registry.iter() {
        for version in set.kernels().iter().filter_map(|k| k.series()) {
            if !series.contains(version) {
                series.push(version.clone());
            }
        }
    }
    series
}

/// Resolve and emit recipes for each series.
///
/// Checksum listings are fetched once per major version.
pub fn update_recipes(
    meta: &dyn KernelMetadata,
    series: &[KernelVersion],
    opts: &UpdateOptions,
) -> Result<Vec<(ResolvedKernel, RecipeFiles)>> {
    let mut listings: HashMap<u32, String> = HashMap::new();
    let mut updated = Vec::new();

    for s in series {
        if !listings.contains_key(&s.major()) {
            let fetched = meta.checksum_listing(s.major())?;
            listings.insert(s.major(), fetched);
        }

        let kernel = resolve_kernel(meta, &listings[&s.major()], s)
            .with_context(|| format!("failed to resolve kernel series {}", s))?;
        let files = RecipeFiles::for_series(&opts.layer_dir, s);

        if opts.dry_run {
            tracing::info!("Would write {}", files.recipe.display());
            tracing::info!("Would write {}", files.kas_include.display());
        } else {
            write_string(&files.recipe, &render_recipe(&kernel))?;
            write_string(&files.kas_include, &render_kas_include(&kernel))?;
            tracing::info!("Updated {} to {}", s, kernel.version);
        }

        updated.push((kernel, files));
    }

    Ok(updated)
}
