//! Geographic partitions that models are fitted over.
//!
//! Every observation is recorded per federative unit. A [`Level`] decides how
//! those units are grouped before fitting: one national series, one series per
//! macro-region, or one series per unit.

use crate::region::Region;
use crate::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label used for the national partition.
pub const NATIONAL_LABEL: &str = "Brasil";

/// Errors raised while parsing levels or partition labels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeoError {
    /// Unknown partition level
    #[error("Unknown level: {0} (expected national, regional or state)")]
    UnknownLevel(String),

    /// Label does not name a partition at the level
    #[error("Unknown {level} partition: {label}")]
    UnknownPartition {
        /// Level the label was parsed at
        level: Level,
        /// Offending label
        label: String,
    },
}

/// Geographic granularity of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Whole country
    National,
    /// IBGE macro-region
    Regional,
    /// Federative unit
    State,
}

impl Level {
    /// Returns all levels from coarsest to finest.
    pub fn all() -> Vec<Self> {
        vec![Self::National, Self::Regional, Self::State]
    }

    /// Returns the lowercase level name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::National => "national",
            Self::Regional => "regional",
            Self::State => "state",
        }
    }

    /// Lists every partition at this level in report order.
    pub fn partitions(&self) -> Vec<PartitionKey> {
        match self {
            Self::National => vec![PartitionKey::National],
            Self::Regional => Region::all()
                .into_iter()
                .map(PartitionKey::Region)
                .collect(),
            Self::State => State::all().into_iter().map(PartitionKey::State).collect(),
        }
    }

    /// Maps a federative unit to the partition that contains it at this level.
    pub const fn key_for(&self, state: State) -> PartitionKey {
        match self {
            Self::National => PartitionKey::National,
            Self::Regional => PartitionKey::Region(state.region()),
            Self::State => PartitionKey::State(state),
        }
    }

    /// Parse a partition label produced by [`PartitionKey::label`].
    pub fn parse_partition(&self, label: &str) -> Result<PartitionKey, GeoError> {
        self.partitions()
            .into_iter()
            .find(|key| key.label() == label.trim())
            .ok_or_else(|| GeoError::UnknownPartition {
                level: *self,
                label: label.to_string(),
            })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Level {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "national" | "nacional" | "br" => Ok(Self::National),
            "regional" | "region" => Ok(Self::Regional),
            "state" | "uf" => Ok(Self::State),
            other => Err(GeoError::UnknownLevel(other.to_string())),
        }
    }
}

/// Key of one independently fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartitionKey {
    /// The whole country
    National,
    /// One macro-region
    Region(Region),
    /// One federative unit
    State(State),
}

impl PartitionKey {
    /// Returns the level this key belongs to.
    pub const fn level(&self) -> Level {
        match self {
            Self::National => Level::National,
            Self::Region(_) => Level::Regional,
            Self::State(_) => Level::State,
        }
    }

    /// Returns the label stored in panel frames.
    ///
    /// Labels are unique within a level. Region names never collide with UF
    /// codes, so labels are unique across levels too.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::National => NATIONAL_LABEL,
            Self::Region(region) => region.name(),
            Self::State(state) => state.code(),
        }
    }

    /// Returns a human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::National => NATIONAL_LABEL.to_string(),
            Self::Region(region) => format!("Região {}", region.name()),
            Self::State(state) => format!("{} ({})", state.name(), state.code()),
        }
    }

    /// Returns true when the unit belongs to this partition.
    pub fn contains(&self, state: State) -> bool {
        self.level().key_for(state) == *self
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Level::National, 1)]
    #[case(Level::Regional, 5)]
    #[case(Level::State, 27)]
    fn test_partition_counts(#[case] level: Level, #[case] expected: usize) {
        assert_eq!(level.partitions().len(), expected);
    }

    #[test]
    fn test_key_for() {
        assert_eq!(Level::National.key_for(State::SP), PartitionKey::National);
        assert_eq!(
            Level::Regional.key_for(State::SP),
            PartitionKey::Region(Region::Sudeste)
        );
        assert_eq!(
            Level::State.key_for(State::SP),
            PartitionKey::State(State::SP)
        );
    }

    #[test]
    fn test_labels_unique_across_levels() {
        let mut labels: Vec<&str> = Level::all()
            .iter()
            .flat_map(Level::partitions)
            .map(|k| k.label())
            .collect();
        let total = labels.len();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), total);
    }

    #[test]
    fn test_parse_partition_roundtrip() {
        for level in Level::all() {
            for key in level.partitions() {
                assert_eq!(level.parse_partition(key.label()), Ok(key));
            }
        }
        assert!(Level::State.parse_partition("Sudeste").is_err());
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("National".parse::<Level>(), Ok(Level::National));
        assert_eq!("uf".parse::<Level>(), Ok(Level::State));
        assert!("county".parse::<Level>().is_err());
    }

    #[test]
    fn test_contains() {
        let sul = PartitionKey::Region(Region::Sul);
        assert!(sul.contains(State::RS));
        assert!(!sul.contains(State::SP));
        assert!(PartitionKey::National.contains(State::AC));
    }
}
