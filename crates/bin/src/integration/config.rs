//! Configuration file handling.
//!
//! Settings come from an optional `transito.toml`; every field has a default
//! and command-line flags override what the file says.

use super::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use transito::data::prf::DatatranSource;
use transito::geo::Level;
use transito::model::ModelSpec;
use transito::panel::{JoinStrategy, Resolution};

/// Name of the configuration file looked up in the working directory.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "transito.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Input datasets.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Panel construction.
    #[serde(default)]
    pub panel: PanelConfig,

    /// What to fit.
    #[serde(default)]
    pub model: ModelSpec,

    /// Report output.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the input datasets live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SourcesConfig {
    /// Archive years to load.
    #[serde(default = "default_years")]
    pub years: Vec<i32>,

    /// PRF archive URL with a `{year}` placeholder.
    #[serde(default)]
    pub prf_url_template: Option<String>,

    /// PRF archive URL per year, keyed by the year.
    #[serde(default)]
    pub prf_urls: BTreeMap<String, String>,

    /// Directory with pre-downloaded `datatran<YEAR>.zip` files.
    #[serde(default = "default_archive_dir")]
    pub prf_archive_dir: Option<PathBuf>,

    /// Directory downloads are stored in; defaults to the cache directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// RENAVAM fleet CSV.
    #[serde(default = "default_fleet")]
    pub fleet: Option<PathBuf>,

    /// IBGE GDP CSV.
    #[serde(default = "default_gdp")]
    pub gdp: Option<PathBuf>,

    /// DataSUS deaths CSV.
    #[serde(default = "default_deaths")]
    pub deaths: Option<PathBuf>,

    /// Archives downloaded at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            prf_url_template: None,
            prf_urls: BTreeMap::new(),
            prf_archive_dir: default_archive_dir(),
            download_dir: None,
            fleet: default_fleet(),
            gdp: default_gdp(),
            deaths: default_deaths(),
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_years() -> Vec<i32> {
    (2017..=2023).collect()
}

fn default_archive_dir() -> Option<PathBuf> {
    Some(PathBuf::from("data/prf"))
}

fn default_fleet() -> Option<PathBuf> {
    Some(PathBuf::from("data/frota.csv"))
}

fn default_gdp() -> Option<PathBuf> {
    Some(PathBuf::from("data/pib.csv"))
}

fn default_deaths() -> Option<PathBuf> {
    Some(PathBuf::from("data/obitos.csv"))
}

const fn default_concurrency() -> usize {
    4
}

const fn default_timeout() -> u64 {
    300
}

impl SourcesConfig {
    /// Where each PRF archive comes from.
    pub(crate) fn datatran_source(&self) -> Result<DatatranSource, PipelineError> {
        let mut urls = BTreeMap::new();
        for (year, url) in &self.prf_urls {
            let year = year
                .trim()
                .parse::<i32>()
                .map_err(|_| PipelineError::Config(format!("invalid PRF url year '{year}'")))?;
            urls.insert(year, url.clone());
        }

        Ok(DatatranSource {
            url_template: self.prf_url_template.clone(),
            urls,
            archive_dir: self.prf_archive_dir.clone(),
        })
    }
}

/// How the panel is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PanelConfig {
    /// Period resolution.
    #[serde(default)]
    pub resolution: Resolution,

    /// Join of the sources.
    #[serde(default)]
    pub join: JoinStrategy,
}

/// Report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// HTML output path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Directory for CSV/JSON exports; none when unset.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Export format: `csv`, `json` or `pretty-json`.
    #[serde(default = "default_export_format")]
    pub export_format: String,

    /// Levels to fit, coarsest first.
    #[serde(default = "default_levels")]
    pub levels: Vec<Level>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output: default_output(),
            export_dir: None,
            export_format: default_export_format(),
            levels: default_levels(),
        }
    }
}

fn default_title() -> String {
    "Mortes no trânsito: modelos de regressão".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("transito_report.html")
}

fn default_export_format() -> String {
    "csv".to_string()
}

fn default_levels() -> Vec<Level> {
    Level::all()
}

impl Config {
    /// Load configuration from a file path.
    pub(crate) fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, else `transito.toml` when present, else defaults.
    pub(crate) fn load_or_default(path: Option<&Path>) -> Result<Self, PipelineError> {
        path.map_or_else(
            || {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            },
            Self::load,
        )
    }

    /// Reject settings that cannot produce a report.
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        self.model.validate()?;
        if self.sources.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        if self.report.levels.is_empty() {
            return Err(PipelineError::Config(
                "report.levels must name at least one level".to_string(),
            ));
        }
        self.sources.datatran_source()?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub(crate) fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }
}
