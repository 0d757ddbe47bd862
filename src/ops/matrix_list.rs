//! Implementation of `kernel-matrix list`.

use serde::Serialize;

use crate::core::{BuildSet, BuildSetRegistry};

/// One registry entry.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSetSummary {
    pub name: String,
    pub size: usize,
    pub releases: Vec<String>,
    pub machines: Vec<String>,
    pub kernels: Vec<String>,
}

/// One unit of a build set, as it would run.
#[derive(Debug, Clone, Serialize)]
pub struct UnitPlan {
    /// 1-based position in run order
    pub index: usize,
    pub release: String,
    pub machine: String,
    pub kernel: String,
    pub skip: bool,
    pub log: String,
}

pub fn summarize(registry: &BuildSetRegistry) -> Vec<BuildSetSummary> {
    registry
        .iter()
        .map(|set| BuildSetSummary {
            name: set.name().to_string(),
            size: set.size(),
            releases: set.releases().to_vec(),
            machines: set.machines().to_vec(),
            kernels: set.kernels().iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

pub fn plan(set: &BuildSet) -> Vec<UnitPlan> {
    set.units()
        .enumerate()
        .map(|(i, unit)| UnitPlan {
            index: i + 1,
            release: unit.release().to_string(),
            machine: unit.machine().to_string(),
            kernel: unit.kernel().to_string(),
            skip: unit.should_skip(),
            log: unit.logpath().display().to_string(),
        })
        .collect()
}
