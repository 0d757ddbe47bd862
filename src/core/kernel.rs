//! Kernel tags - symbolic flavors and dotted numeric series.
//!
//! A kernel tag selects which kernel recipe a build uses. It is either one of
//! the rolling flavors (`lts`, `stable`, `mainline`) or a dotted series such
//! as `5.10`. Numeric tags are parsed once, when a build set is constructed,
//! so nothing downstream ever compares a malformed tag.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::core::errors::MatrixError;

/// Rolling kernel flavors that track an upstream branch rather than a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Lts,
    Stable,
    Mainline,
}

impl Flavor {
    pub const ALL: [Flavor; 3] = [Flavor::Lts, Flavor::Stable, Flavor::Mainline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Lts => "lts",
            Flavor::Stable => "stable",
            Flavor::Mainline => "mainline",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Flavor::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// A dotted numeric kernel version, e.g. `5.10` or `5.4.280`.
///
/// Ordering is component-wise, like a tuple: `5.4 < 5.10` and `5 < 5.10`.
/// The original spelling is kept so paths and config names round-trip exactly.
#[derive(Debug, Clone)]
pub struct KernelVersion {
    parts: Vec<u32>,
    text: String,
}

impl KernelVersion {
    /// Build a version from its numeric components.
    pub fn new(parts: &[u32]) -> Self {
        let text = parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        KernelVersion {
            parts: parts.to_vec(),
            text,
        }
    }

    /// Parse a dotted version, returning `None` if any component is not a number.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        let parts = s
            .split('.')
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u32>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()?;

        Some(KernelVersion {
            parts,
            text: s.to_string(),
        })
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    /// The leading component (`5` for `5.10`), or 0 for an empty version.
    pub fn major(&self) -> u32 {
        self.parts.first().copied().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `self` is `series` itself or a point release of it.
    ///
    /// `5.4.280` belongs to `5.4`; `5.40.1` does not.
    pub fn belongs_to(&self, series: &KernelVersion) -> bool {
        self.parts.len() >= series.parts.len() && self.parts[..series.parts.len()] == series.parts[..]
    }
}

impl PartialEq for KernelVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for KernelVersion {}

impl PartialOrd for KernelVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KernelVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl std::hash::Hash for KernelVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for KernelVersion {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KernelVersion::parse(s).ok_or_else(|| MatrixError::MalformedKernelTag { tag: s.to_string() })
    }
}

/// The kernel axis of a build matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KernelTag {
    Flavor(Flavor),
    Series(KernelVersion),
}

impl KernelTag {
    /// The numeric series, if this tag is not a flavor.
    pub fn series(&self) -> Option<&KernelVersion> {
        match self {
            KernelTag::Flavor(_) => None,
            KernelTag::Series(v) => Some(v),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KernelTag::Flavor(f) => f.as_str(),
            KernelTag::Series(v) => v.as_str(),
        }
    }
}

impl FromStr for KernelTag {
    type Err = MatrixError;

    /// Flavor names are matched first; everything else must be a dotted number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(flavor) = Flavor::from_name(s) {
            return Ok(KernelTag::Flavor(flavor));
        }
        s.parse().map(KernelTag::Series)
    }
}

impl fmt::Display for KernelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
