//! Lineage of generated documents
//!
//! A document produced by slide injection is saved as `<name>_v<N>.pptx`.
//! Lineage is derived from that filename convention every time it is needed
//! and never stored alongside the record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::models::GeneratedArtifactRecord;

/// Bucket a generated document falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lineage {
    /// Output of `POST /generate`
    Generated,
    /// Versioned presentation produced by image injection
    Optimized,
}

/// List filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    All,
    Generated,
    Optimized,
}

impl FilterKind {
    pub fn admits(&self, lineage: Lineage) -> bool {
        match self {
            Self::All => true,
            Self::Generated => lineage == Lineage::Generated,
            Self::Optimized => lineage == Lineage::Optimized,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Generated => "generated",
            Self::Optimized => "optimized",
        };
        f.write_str(name)
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "generated" => Ok(Self::Generated),
            "optimized" => Ok(Self::Optimized),
            other => Err(Error::validation(format!("Unknown filter: {}", other))),
        }
    }
}

/// True when `filename` ends in `_v<digits>.pptx`, ignoring case.
pub fn is_versioned_presentation(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    let Some(stem) = lower.strip_suffix(".pptx") else {
        return false;
    };

    let without_digits = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    without_digits.len() < stem.len() && without_digits.ends_with("_v")
}

pub fn lineage_of(filename: &str) -> Lineage {
    if is_versioned_presentation(filename) {
        Lineage::Optimized
    } else {
        Lineage::Generated
    }
}

/// Records admitted by `filter`, in input order.
pub fn classify(records: &[GeneratedArtifactRecord], filter: FilterKind) -> Vec<GeneratedArtifactRecord> {
    records
        .iter()
        .filter(|record| filter.admits(lineage_of(&record.filename)))
        .cloned()
        .collect()
}
