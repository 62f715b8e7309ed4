//! Variable Registry
//!
//! Every numeric column a panel can carry, where it comes from and how it
//! behaves when periods are coarsened.

use crate::columns;
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a variable combines across months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Counted over the period; summed when coarsening
    Flow,
    /// Observed at a point in time; the last month is kept when coarsening
    Stock,
}

impl VariableKind {
    /// Returns the lowercase kind name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Stock => "stock",
        }
    }
}

/// Publisher of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// Federal highway police accident records
    Prf,
    /// National vehicle registry
    Renavam,
    /// Brazilian institute of geography and statistics
    Ibge,
    /// Public health data system
    DataSus,
}

impl DataSource {
    /// Returns every source.
    pub fn all() -> Vec<Self> {
        vec![Self::Prf, Self::Renavam, Self::Ibge, Self::DataSus]
    }

    /// Parse a source from its publisher name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(value))
    }

    /// Returns the publisher name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Prf => "PRF",
            Self::Renavam => "RENAVAM",
            Self::Ibge => "IBGE",
            Self::DataSus => "DataSUS",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Variable metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// Column name (unique identifier)
    pub name: &'static str,
    /// Publisher
    pub source: DataSource,
    /// Aggregation behaviour
    pub kind: VariableKind,
    /// Brief description of what the variable measures
    pub description: &'static str,
}

/// Get all available variable info
pub fn available_variables() -> Vec<VariableInfo> {
    vec![
        // Accident records
        VariableInfo {
            name: columns::ACCIDENTS,
            source: DataSource::Prf,
            kind: VariableKind::Flow,
            description: "Accidents recorded on federal highways",
        },
        VariableInfo {
            name: columns::FATAL_ACCIDENTS,
            source: DataSource::Prf,
            kind: VariableKind::Flow,
            description: "Accidents with at least one death",
        },
        VariableInfo {
            name: columns::INJURED,
            source: DataSource::Prf,
            kind: VariableKind::Flow,
            description: "People injured in accidents",
        },
        VariableInfo {
            name: columns::PRF_DEATHS,
            source: DataSource::Prf,
            kind: VariableKind::Flow,
            description: "Deaths recorded at the accident scene",
        },
        // Fleet
        VariableInfo {
            name: columns::FLEET,
            source: DataSource::Renavam,
            kind: VariableKind::Stock,
            description: "Registered vehicles of every type",
        },
        VariableInfo {
            name: columns::AUTOMOBILES,
            source: DataSource::Renavam,
            kind: VariableKind::Stock,
            description: "Registered automobiles",
        },
        VariableInfo {
            name: columns::MOTORCYCLES,
            source: DataSource::Renavam,
            kind: VariableKind::Stock,
            description: "Registered motorcycles, scooters and mopeds",
        },
        // Economy
        VariableInfo {
            name: columns::GDP,
            source: DataSource::Ibge,
            kind: VariableKind::Flow,
            description: "Gross domestic product",
        },
        // Health records
        VariableInfo {
            name: columns::DATASUS_DEATHS,
            source: DataSource::DataSus,
            kind: VariableKind::Flow,
            description: "Traffic deaths registered by the health system",
        },
    ]
}

/// Get variables published by a source
pub fn variables_by_source(source: DataSource) -> Vec<VariableInfo> {
    available_variables()
        .into_iter()
        .filter(|v| v.source == source)
        .collect()
}

/// Get variable info by name
pub fn get_variable_info(name: &str) -> Option<VariableInfo> {
    available_variables().into_iter().find(|v| v.name == name)
}

/// Aggregation kind of a variable, failing on unknown names.
pub fn variable_kind(name: &str) -> Result<VariableKind> {
    get_variable_info(name)
        .map(|v| v.kind)
        .ok_or_else(|| PanelError::UnknownVariable(name.to_string()))
}
