//! Build units - one (release, machine, kernel) combination.
//!
//! A unit owns every path its build touches. All of them are derived from the
//! work directory and the unit's three tags, so two units of the same matrix
//! never share a build directory or a log file.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::kernel::{KernelTag, KernelVersion};

/// Environment variable naming the build tool's work directory.
pub const ENV_WORK_DIR: &str = "KAS_WORK_DIR";
/// Environment variable naming the build output directory.
pub const ENV_BUILD_DIR: &str = "KAS_BUILD_DIR";
/// Environment variable naming the download cache.
pub const ENV_DL_DIR: &str = "DL_DIR";
/// Environment variable naming the shared-state cache.
pub const ENV_SSTATE_DIR: &str = "SSTATE_DIR";

/// Top-level config every build starts from, unless configured otherwise.
pub const DEFAULT_TOPLEVEL_CONFIG: &str = "kas/base.yml";

/// Release without any RISC-V machine support.
const RISCV_UNSUPPORTED_RELEASE: &str = "dunfell";

/// A concrete build in the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    release: String,
    machine: String,
    kernel: KernelTag,
    workdir: PathBuf,
}

impl BuildUnit {
    pub fn new(
        release: impl Into<String>,
        machine: impl Into<String>,
        kernel: KernelTag,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        BuildUnit {
            release: release.into(),
            machine: machine.into(),
            kernel,
            workdir: workdir.into(),
        }
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn kernel(&self) -> &KernelTag {
        &self.kernel
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `<release>_<machine>_<kernel>`, unique per unit.
    fn slug(&self) -> String {
        format!("{}_{}_{}", self.release, self.machine, self.kernel)
    }

    /// Build output directory, wiped at the start of every attempt.
    pub fn builddir(&self) -> PathBuf {
        self.workdir.join("build").join(self.slug())
    }

    pub fn logdir(&self) -> PathBuf {
        self.workdir.join("logs")
    }

    pub fn logpath(&self) -> PathBuf {
        self.logdir().join(format!("build_{}.log", self.slug()))
    }

    /// Download cache, shared by all units of a work directory.
    pub fn download_dir(&self) -> PathBuf {
        self.workdir.join("downloads")
    }

    /// Shared-state cache, shared by all units of a work directory.
    pub fn sstate_dir(&self) -> PathBuf {
        self.workdir.join("sstate-cache")
    }

    /// Whether this combination is known not to build.
    ///
    /// RISC-V machines are skipped on releases without RISC-V support, and on
    /// numeric kernel series older than 5.10. Flavor tags are never compared.
    pub fn should_skip(&self) -> bool {
        if !self.machine.contains("riscv") {
            return false;
        }

        if self.release == RISCV_UNSUPPORTED_RELEASE {
            return true;
        }

        match self.kernel.series() {
            Some(series) => *series < KernelVersion::new(&[5, 10]),
            None => false,
        }
    }

    /// Variables handed to the build tool on top of the inherited environment.
    pub fn env_overrides(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            (ENV_WORK_DIR, self.workdir.clone()),
            (ENV_BUILD_DIR, self.builddir()),
            (ENV_DL_DIR, self.download_dir()),
            (ENV_SSTATE_DIR, self.sstate_dir()),
        ]
    }

    /// Ordered config files for this unit: top-level, release, machine, kernel.
    ///
    /// A site configuration, when given, comes last so it overrides the rest.
    pub fn config_files(&self, toplevel: &str, siteconf: Option<&Path>) -> Vec<OsString> {
        let mut files: Vec<OsString> = vec![
            toplevel.into(),
            format!("kas/release-{}.yml", self.release).into(),
            format!("kas/machine-{}.yml", self.machine).into(),
            format!("kas/kernel-{}.yml", self.kernel).into(),
        ];

        if let Some(siteconf) = siteconf {
            files.push(siteconf.as_os_str().to_os_string());
        }

        files
    }

    /// The single colon-separated config argument passed to the build tool.
    pub fn config_arg(&self, toplevel: &str, siteconf: Option<&Path>) -> OsString {
        let mut arg = OsString::new();
        for (i, file) in self.config_files(toplevel, siteconf).iter().enumerate() {
            if i > 0 {
                arg.push(":");
            }
            arg.push(file);
        }
        arg
    }
}

impl fmt::Display for BuildUnit {
    /// Fixed-width label so consecutive report lines align.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:<12} {:<9}", self.release, self.machine, self.kernel)
    }
}
