//! The update graph and the sequence resolver.
//!
//! The available-updates document maps each package to an unordered list of
//! atomic `{from, to}` upgrades. The live feed interleaves other entries
//! with the edges (for example `{"stable": "2.0.28"}`), so anything that is
//! not a well-formed edge is skipped rather than failing the document.
//!
//! Resolution is a greedy forward walk: at every step the first edge in
//! document order whose `from` matches the current version is taken, with no
//! backtracking. That is enough for the linear chains the feed publishes.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::package::FactorioPackage;
use crate::version::FactorioVersion;

/// One atomic, installable upgrade for a specific package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateEdge {
    pub from: FactorioVersion,
    pub to: FactorioVersion,
}

impl UpdateEdge {
    pub const fn new(from: FactorioVersion, to: FactorioVersion) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for UpdateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeListError {
    #[error("available-updates document has no \"{package}\" entry: {document}")]
    MissingPackage {
        package: FactorioPackage,
        document: String,
    },
    #[error("available-updates \"{package}\" entry is not an array: {document}")]
    WrongShape {
        package: FactorioPackage,
        document: String,
    },
}

#[derive(Deserialize)]
struct RawEdge {
    from: String,
    to: String,
}

/// Extract the edge list for `package` from a parsed available-updates
/// document, skipping entries that are not `{from, to}` pairs of version
/// strings.
pub fn package_updates(
    doc: &Value,
    package: FactorioPackage,
) -> Result<Vec<UpdateEdge>, EdgeListError> {
    let entry = doc
        .get(package.as_str())
        .ok_or_else(|| EdgeListError::MissingPackage {
            package,
            document: doc.to_string(),
        })?;
    let entries = entry.as_array().ok_or_else(|| EdgeListError::WrongShape {
        package,
        document: doc.to_string(),
    })?;

    let mut edges = Vec::with_capacity(entries.len());
    for value in entries {
        let raw: RawEdge = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("skipping non-edge entry in \"{package}\" updates: {value}");
                continue;
            }
        };
        match (raw.from.parse(), raw.to.parse()) {
            (Ok(from), Ok(to)) => edges.push(UpdateEdge::new(from, to)),
            _ => debug!("skipping edge with malformed version in \"{package}\" updates: {value}"),
        }
    }
    Ok(edges)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The walk got stuck: no edge continues from the named version.
    #[error("no update path: no edge continues from version {0}")]
    NoPathFound(FactorioVersion),
    /// The walk came back to a version it had already visited.
    #[error("update graph cycles back to version {0}")]
    CycleDetected(FactorioVersion),
}

/// Walk the edge list from `start` until the current version equals
/// `target`.
///
/// `start == target` resolves to the empty sequence. When several edges
/// leave one version only the first in document order is ever considered;
/// a walk into a dead end is reported as [`ResolveError::NoPathFound`] even
/// if a path through a later edge exists.
pub fn resolve(
    edges: &[UpdateEdge],
    start: FactorioVersion,
    target: FactorioVersion,
) -> Result<Vec<UpdateEdge>, ResolveError> {
    let mut sequence = Vec::new();
    let mut visited = Vec::new();
    let mut current = start;

    while current != target {
        if visited.contains(&current) {
            return Err(ResolveError::CycleDetected(current));
        }
        visited.push(current);

        let edge = edges
            .iter()
            .find(|edge| edge.from == current)
            .ok_or(ResolveError::NoPathFound(current))?;
        sequence.push(*edge);
        current = edge.to;
    }
    Ok(sequence)
}
