//! Build sets and the named build set registry.
//!
//! A build set is the Cartesian product of releases, machines and kernels.
//! Units are produced release-major, then machine, then kernel; this order is
//! what the report numbers, so it must not change.

use std::path::{Path, PathBuf};

use crate::core::errors::MatrixError;
use crate::core::kernel::{Flavor, KernelTag, KernelVersion};
use crate::core::unit::BuildUnit;
use crate::util::config::BuildSetConfig;

/// Name used when no build set is requested explicitly.
pub const DEFAULT_BUILD_SET: &str = "default";

/// Characters a release or machine name may not contain.
///
/// `_` separates the tags in unit paths, `/` and `\` would leave the work
/// directory, and `:` separates entries of the config list.
pub const RESERVED_NAME_CHARS: &[char] = &['_', '/', '\\', ':'];

/// An ordered matrix of builds bound to a work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSet {
    name: String,
    releases: Vec<String>,
    machines: Vec<String>,
    kernels: Vec<KernelTag>,
    workdir: PathBuf,
}

impl BuildSet {
    /// Create a build set, validating every name and kernel tag.
    ///
    /// The work directory defaults to `.` until [`BuildSet::with_workdir`] binds it.
    pub fn new<S: AsRef<str>>(
        name: &str,
        releases: &[S],
        machines: &[S],
        kernels: &[S],
    ) -> Result<Self, MatrixError> {
        let name = name.to_string();

        for (axis, len) in [
            ("releases", releases.len()),
            ("machines", machines.len()),
            ("kernels", kernels.len()),
        ] {
            if len == 0 {
                return Err(MatrixError::EmptyBuildSet { name, axis });
            }
        }

        for (axis, values) in [("releases", releases), ("machines", machines)] {
            if let Some(bad) = values.iter().find(|v| !is_valid_name((*v).as_ref())) {
                return Err(MatrixError::InvalidAxisEntry {
                    name,
                    axis,
                    value: bad.as_ref().to_string(),
                });
            }
        }

        let kernels = kernels
            .iter()
            .map(|k| k.as_ref().parse::<KernelTag>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_parts(
            &name,
            releases.iter().map(|s| s.as_ref().to_string()).collect(),
            machines.iter().map(|s| s.as_ref().to_string()).collect(),
            kernels,
        ))
    }

    fn from_parts(
        name: &str,
        releases: Vec<String>,
        machines: Vec<String>,
        kernels: Vec<KernelTag>,
    ) -> Self {
        BuildSet {
            name: name.to_string(),
            releases,
            machines,
            kernels,
            workdir: PathBuf::from("."),
        }
    }

    /// Bind the work directory every unit of this set builds in.
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn releases(&self) -> &[String] {
        &self.releases
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    pub fn kernels(&self) -> &[KernelTag] {
        &self.kernels
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Number of units in the matrix.
    pub fn size(&self) -> usize {
        self.releases.len() * self.machines.len() * self.kernels.len()
    }

    /// Iterate the units in run order. Each call starts a fresh iteration.
    pub fn units(&self) -> impl Iterator<Item = BuildUnit> + '_ {
        self.releases.iter().flat_map(move |release| {
            self.machines.iter().flat_map(move |machine| {
                self.kernels.iter().map(move |kernel| {
                    BuildUnit::new(release, machine, kernel.clone(), &self.workdir)
                })
            })
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(RESERVED_NAME_CHARS)
}

/// Kernel tag as written in the built-in table.
#[derive(Clone, Copy)]
enum Builtin {
    Flavor(Flavor),
    Series(&'static [u32]),
}

impl Builtin {
    fn tag(self) -> KernelTag {
        match self {
            Builtin::Flavor(flavor) => KernelTag::Flavor(flavor),
            Builtin::Series(parts) => KernelTag::Series(KernelVersion::new(parts)),
        }
    }
}

const LTS: Builtin = Builtin::Flavor(Flavor::Lts);
const STABLE: Builtin = Builtin::Flavor(Flavor::Stable);
const MAINLINE: Builtin = Builtin::Flavor(Flavor::Mainline);

/// Built-in build sets: name, releases, machines, kernels.
const BUILTIN: &[(&str, &[&str], &[&str], &[Builtin])] = &[
    (
        "default",
        &["kirkstone", "master"],
        &["qemux86-64", "qemuriscv64", "qemuarm64"],
        &[LTS, STABLE, MAINLINE],
    ),
    (
        "quick",
        &["master"],
        &["qemux86-64"],
        &[LTS, STABLE, MAINLINE],
    ),
    (
        "extended",
        &["dunfell", "kirkstone", "master"],
        &["qemux86-64", "qemuarm64", "qemuriscv64", "qemux86", "qemuarm", "qemuriscv32"],
        &[
            Builtin::Series(&[5, 10]),
            Builtin::Series(&[5, 15]),
            LTS,
            STABLE,
            MAINLINE,
        ],
    ),
    (
        "all",
        &["dunfell", "kirkstone", "nanbield", "master"],
        &["qemux86-64", "qemuarm64", "qemuriscv64", "qemux86", "qemuarm", "qemuriscv32"],
        &[
            Builtin::Series(&[4, 14]),
            Builtin::Series(&[4, 19]),
            Builtin::Series(&[5, 4]),
            Builtin::Series(&[5, 10]),
            Builtin::Series(&[5, 15]),
            LTS,
            STABLE,
            MAINLINE,
        ],
    ),
    (
        "riscv",
        &["kirkstone", "nanbield", "master"],
        &["qemuriscv64", "qemuriscv32"],
        &[Builtin::Series(&[5, 15]), LTS, STABLE, MAINLINE],
    ),
];

/// Read-only table of named build sets, built once at startup.
#[derive(Debug, Clone)]
pub struct BuildSetRegistry {
    sets: Vec<BuildSet>,
}

impl BuildSetRegistry {
    /// The built-in build sets.
    pub fn builtin() -> Self {
        let sets = BUILTIN
            .iter()
            .map(|&(name, releases, machines, kernels)| {
                BuildSet::from_parts(
                    name,
                    releases.iter().map(|s| s.to_string()).collect(),
                    machines.iter().map(|s| s.to_string()).collect(),
                    kernels.iter().map(|k| k.tag()).collect(),
                )
            })
            .collect();

        BuildSetRegistry { sets }
    }

    /// The built-in sets plus any declared in configuration.
    ///
    /// A configured set with a built-in name replaces the built-in one in place.
    pub fn with_configured<'a>(
        configured: impl IntoIterator<Item = (&'a String, &'a BuildSetConfig)>,
    ) -> Result<Self, MatrixError> {
        let mut registry = Self::builtin();

        for (name, cfg) in configured {
            let set = BuildSet::new(
                name,
                cfg.releases.as_slice(),
                cfg.machines.as_slice(),
                cfg.kernels.as_slice(),
            )?;
            match registry.sets.iter_mut().find(|s| s.name == *name) {
                Some(existing) => *existing = set,
                None => registry.sets.push(set),
            }
        }

        Ok(registry)
    }

    /// Look up a build set by exact name.
    pub fn get(&self, name: &str) -> Result<&BuildSet, MatrixError> {
        self.sets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| MatrixError::UnknownBuildSet {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildSet> {
        self.sets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_builtin_sizes() {
        let registry = BuildSetRegistry::builtin();
        let expected = [
            ("default", 18),
            ("quick", 3),
            ("extended", 90),
            ("all", 192),
            ("riscv", 24),
        ];

        for (name, size) in expected {
            let set = registry.get(name).unwrap();
            assert_eq!(set.size(), size, "size of {}", name);
            assert_eq!(
                set.size(),
                set.releases().len() * set.machines().len() * set.kernels().len()
            );
            assert_eq!(set.units().count(), size, "units of {}", name);
        }
    }

    #[test]
    fn test_builtin_table_passes_validation() {
        for set in BuildSetRegistry::builtin().iter() {
            let kernels: Vec<_> = set.kernels().iter().map(|k| k.to_string()).collect();
            let checked = BuildSet::new(set.name(), set.releases(), set.machines(), &kernels)
                .unwrap_or_else(|e| panic!("built-in set {} is invalid: {}", set.name(), e));
            assert_eq!(&checked, set);
        }
    }

    #[test]
    fn test_units_order_is_release_major() {
        let registry = BuildSetRegistry::builtin();
        let set = registry.get("default").unwrap();
        let units: Vec<_> = set
            .units()
            .map(|u| format!("{}/{}/{}", u.release(), u.machine(), u.kernel()))
            .collect();

        assert_eq!(units[0], "kirkstone/qemux86-64/lts");
        assert_eq!(units[1], "kirkstone/qemux86-64/stable");
        assert_eq!(units[2], "kirkstone/qemux86-64/mainline");
        assert_eq!(units[3], "kirkstone/qemuriscv64/lts");
        assert_eq!(units[9], "master/qemux86-64/lts");
        assert_eq!(units[17], "master/qemuarm64/mainline");
    }

    #[test]
    fn test_units_are_restartable() {
        let set = BuildSetRegistry::builtin().get("quick").unwrap().clone();
        let first: Vec<_> = set.units().collect();
        let second: Vec<_> = set.units().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_units_bound_to_workdir() {
        let set = BuildSetRegistry::builtin()
            .get("quick")
            .unwrap()
            .clone()
            .with_workdir("/srv/ci");
        assert!(set.units().all(|u| u.workdir() == Path::new("/srv/ci")));
    }

    #[test]
    fn test_unknown_name() {
        let registry = BuildSetRegistry::builtin();
        match registry.get("nightly") {
            Err(MatrixError::UnknownBuildSet { name, available }) => {
                assert_eq!(name, "nightly");
                assert_eq!(available, ["default", "quick", "extended", "all", "riscv"]);
            }
            other => panic!("expected UnknownBuildSet, got {:?}", other),
        }
    }

    #[test]
    fn test_configured_sets() {
        let mut configured = BTreeMap::new();
        configured.insert(
            "nightly".to_string(),
            BuildSetConfig {
                releases: vec!["master".into()],
                machines: vec!["qemuarm64".into()],
                kernels: vec!["mainline".into(), "6.6".into()],
            },
        );
        configured.insert(
            "quick".to_string(),
            BuildSetConfig {
                releases: vec!["master".into()],
                machines: vec!["qemux86".into()],
                kernels: vec!["lts".into()],
            },
        );

        let registry = BuildSetRegistry::with_configured(&configured).unwrap();
        assert_eq!(registry.get("nightly").unwrap().size(), 2);
        assert_eq!(registry.get("quick").unwrap().machines(), ["qemux86"]);
        assert_eq!(registry.names().nth(1), Some("quick"));
        assert_eq!(registry.names().last(), Some("nightly"));
    }

    #[test]
    fn test_configured_malformed_kernel_is_fatal() {
        let mut configured = BTreeMap::new();
        configured.insert(
            "broken".to_string(),
            BuildSetConfig {
                releases: vec!["master".into()],
                machines: vec!["qemuriscv64".into()],
                kernels: vec!["5.x".into()],
            },
        );

        let err = BuildSetRegistry::with_configured(&configured).unwrap_err();
        assert!(matches!(err, MatrixError::MalformedKernelTag { tag } if tag == "5.x"));
    }

    #[test]
    fn test_separator_in_names_rejected() {
        // Both would map to build_a_b_c_lts.log
        let err = BuildSet::new("clash", &["a_b"], &["c"], &["lts"]).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::InvalidAxisEntry { axis: "releases", ref value, .. } if value == "a_b"
        ));

        let err = BuildSet::new("clash", &["a"], &["b_c"], &["lts"]).unwrap_err();
        assert!(matches!(err, MatrixError::InvalidAxisEntry { axis: "machines", .. }));
    }

    #[test]
    fn test_path_escaping_names_rejected() {
        for bad in ["../etc", "a/b", "", "a:b", "a\\b"] {
            let err = BuildSet::new("escape", &["master"], &[bad], &["lts"]).unwrap_err();
            assert!(
                matches!(err, MatrixError::InvalidAxisEntry { ref value, .. } if value == bad),
                "accepted machine {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_configured_invalid_name_is_fatal() {
        let mut configured = BTreeMap::new();
        configured.insert(
            "nightly".to_string(),
            BuildSetConfig {
                releases: vec!["../..".into()],
                machines: vec!["qemuarm64".into()],
                kernels: vec!["lts".into()],
            },
        );

        let err = BuildSetRegistry::with_configured(&configured).unwrap_err();
        assert!(err.to_string().contains("invalid releases entry `../..`"));
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = BuildSet::new::<&str>("empty", &["master"], &[], &["lts"]).unwrap_err();
        assert!(matches!(err, MatrixError::EmptyBuildSet { axis: "machines", .. }));
    }
}
