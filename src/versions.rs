//! The {interpreter family × minor release} matrix a run sweeps over.

use anyhow::{Result, bail};
use std::fmt;

/// Every release the harness knows how to drive. Families and minors in
/// declaration order – expansion iterates exactly this table.
const SUPPORTED: &[(u32, &[u32])] = &[(3, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12])];

/// One interpreter release, e.g. `3.10`.
///
/// Ordering is numeric on (family, minor); `3.10` sorts after `3.9`
/// even though the compact string `"310"` sorts before `"39"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId {
    pub family: u32,
    pub minor: u32,
}

impl VersionId {
    pub fn new(family: u32, minor: u32) -> Self {
        Self { family, minor }
    }

    /// Parse the compact digit form used on the command line and in
    /// bytecode cache names: the first digit is the family, the rest
    /// the minor release (`"310"` → 3.10).
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() < 2 || !text.chars().all(|c| c.is_ascii_digit()) {
            bail!("Version must consist only of digits. (e.g. \"39\")");
        }
        Ok(Self {
            family: text[..1].parse()?,
            minor: text[1..].parse()?,
        })
    }

    /// The undotted form bytecode cache names carry (`310`).
    pub fn compact(&self) -> String {
        format!("{}{}", self.family, self.minor)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.minor)
    }
}

/// Ordered family → minors mapping. Defaults to the full support table
/// and can be narrowed to an explicit subset before a run starts.
#[derive(Debug, Clone)]
pub struct VersionMatrix {
    families: Vec<(u32, Vec<u32>)>,
}

impl VersionMatrix {
    /// The full support table.
    pub fn supported() -> Self {
        Self {
            families: SUPPORTED
                .iter()
                .map(|(family, minors)| (*family, minors.to_vec()))
                .collect(),
        }
    }

    pub fn is_supported(id: VersionId) -> bool {
        SUPPORTED
            .iter()
            .any(|(family, minors)| *family == id.family && minors.contains(&id.minor))
    }

    /// Replace the matrix with exactly `ids`, grouped by family in first
    /// appearance order. Anything outside the support table is rejected
    /// here, before any compile or decompile work has started.
    pub fn restrict_to(&mut self, ids: &[VersionId]) -> Result<()> {
        let mut families: Vec<(u32, Vec<u32>)> = Vec::new();
        for id in ids {
            if !Self::is_supported(*id) {
                bail!(
                    "Version \"{}\" not supported. Supported versions are: {}",
                    id,
                    supported_list()
                );
            }
            match families.iter_mut().find(|(family, _)| *family == id.family) {
                Some((_, minors)) => {
                    if !minors.contains(&id.minor) {
                        minors.push(id.minor);
                    }
                }
                None => families.push((id.family, vec![id.minor])),
            }
        }
        self.families = families;
        Ok(())
    }

    /// Flat iteration order: families as declared, minors as declared.
    pub fn expand(&self) -> Vec<VersionId> {
        self.families
            .iter()
            .flat_map(|(family, minors)| minors.iter().map(|minor| VersionId::new(*family, *minor)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.families.iter().map(|(_, minors)| minors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn supported_list() -> String {
    SUPPORTED
        .iter()
        .flat_map(|(family, minors)| minors.iter().map(move |minor| format!("{family}.{minor}")))
        .collect::<Vec<_>>()
        .join(", ")
}
