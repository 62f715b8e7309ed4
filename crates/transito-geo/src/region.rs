//! IBGE macro-region definitions.

use crate::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five IBGE macro-regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Norte
    Norte,

    /// Nordeste
    Nordeste,

    /// Centro-Oeste
    CentroOeste,

    /// Sudeste
    Sudeste,

    /// Sul
    Sul,
}

impl Region {
    /// Returns all regions in IBGE order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Norte,
            Self::Nordeste,
            Self::CentroOeste,
            Self::Sudeste,
            Self::Sul,
        ]
    }

    /// Returns the short region code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Norte => "N",
            Self::Nordeste => "NE",
            Self::CentroOeste => "CO",
            Self::Sudeste => "SE",
            Self::Sul => "S",
        }
    }

    /// Returns the region name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Norte => "Norte",
            Self::Nordeste => "Nordeste",
            Self::CentroOeste => "Centro-Oeste",
            Self::Sudeste => "Sudeste",
            Self::Sul => "Sul",
        }
    }

    /// Parse a region from its code or name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(value) || r.name().eq_ignore_ascii_case(value))
    }

    /// Returns the federative units in this region.
    pub fn states(&self) -> Vec<State> {
        State::all()
            .into_iter()
            .filter(|s| s.region() == *self)
            .collect()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
