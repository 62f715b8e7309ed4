//! Time resolution and periods.

use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Length of the periods a panel is aggregated to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Calendar months
    #[default]
    Monthly,
    /// Calendar quarters
    Quarterly,
    /// Calendar years
    Annual,
}

impl Resolution {
    /// Returns the lowercase resolution name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Number of periods in a calendar year.
    pub const fn periods_per_year(&self) -> i32 {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::Annual => 1,
        }
    }

    /// Index of the period containing `month` (1-12).
    pub const fn index_of_month(&self, month: i32) -> i32 {
        match self {
            Self::Monthly => month,
            Self::Quarterly => (month - 1) / 3 + 1,
            Self::Annual => 1,
        }
    }

    /// Period containing the given calendar month.
    pub const fn period_of(&self, year: i32, month: i32) -> Period {
        Period {
            resolution: *self,
            year,
            index: self.index_of_month(month),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Resolution {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "mensal" => Ok(Self::Monthly),
            "quarterly" | "quarter" | "trimestral" => Ok(Self::Quarterly),
            "annual" | "yearly" | "year" | "anual" => Ok(Self::Annual),
            other => Err(PanelError::UnknownResolution(other.to_string())),
        }
    }
}

/// One month, quarter or year.
///
/// `index` is the month (1-12), the quarter (1-4) or always 1 for annual
/// periods. Periods of the same resolution order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Resolution of the period
    pub resolution: Resolution,
    /// Calendar year
    pub year: i32,
    /// Position within the year, starting at 1
    pub index: i32,
}

impl Period {
    /// Create a period, validating the index against the resolution.
    pub fn new(resolution: Resolution, year: i32, index: i32) -> Result<Self> {
        if !(1..=resolution.periods_per_year()).contains(&index) {
            return Err(PanelError::InvalidPeriod {
                resolution: resolution.name().to_string(),
                index,
            });
        }
        Ok(Self {
            resolution,
            year,
            index,
        })
    }

    /// Rebuild a period from its ordinal.
    pub const fn from_ordinal(resolution: Resolution, ordinal: i32) -> Self {
        let per_year = resolution.periods_per_year();
        Self {
            resolution,
            year: ordinal.div_euclid(per_year),
            index: ordinal.rem_euclid(per_year) + 1,
        }
    }

    /// Consecutive integer numbering of the periods of a resolution.
    pub const fn ordinal(&self) -> i32 {
        self.year * self.resolution.periods_per_year() + self.index - 1
    }

    /// Label stored in panel frames: `2019-03`, `2019Q1` or `2019`.
    pub fn label(&self) -> String {
        match self.resolution {
            Resolution::Monthly => format!("{}-{:02}", self.year, self.index),
            Resolution::Quarterly => format!("{}Q{}", self.year, self.index),
            Resolution::Annual => self.year.to_string(),
        }
    }

    /// Calendar months covered by the period.
    pub const fn months(&self) -> RangeInclusive<i32> {
        match self.resolution {
            Resolution::Monthly => self.index..=self.index,
            Resolution::Quarterly => {
                let first = (self.index - 1) * 3 + 1;
                first..=first + 2
            }
            Resolution::Annual => 1..=12,
        }
    }

    /// The following period.
    pub const fn next(&self) -> Self {
        Self::from_ordinal(self.resolution, self.ordinal() + 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
