//! Data pipeline from configured sources to fitted models.
//!
//! Downloads the yearly PRF archives (or reads them from the accident
//! cache), loads the reference CSVs the model needs, builds one panel per
//! level and fits a partitioned model on each.

use super::cache_manager;
use super::config::SourcesConfig;
use super::error::PipelineError;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use transito::data::cache::AccidentCache;
use transito::data::prf::{DatatranClient, YearSummary, summarize_archive};
use transito::data::reference::{load_deaths, load_fleet, load_gdp};
use transito::geo::Level;
use transito::model::{ModelSpec, PartitionedModel};
use transito::panel::{
    DataSource, JoinStrategy, Panel, Resolution, SourceFrame, build_panel, get_variable_info,
};

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cache and re-download).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Datasets that provide the model's response and predictors.
pub(crate) fn required_sources(spec: &ModelSpec) -> Result<BTreeSet<DataSource>, PipelineError> {
    std::iter::once(&spec.response)
        .chain(&spec.predictors)
        .map(|name| {
            get_variable_info(name)
                .map(|info| info.source)
                .ok_or_else(|| PipelineError::Config(format!("unknown variable '{name}'")))
        })
        .collect()
}

/// Download (or reuse) and summarize the archives of the given years.
///
/// Archives are fetched concurrently, bounded by `sources.concurrency`.
/// The first failure stops the whole fetch.
pub(crate) async fn fetch_archives(
    sources: &SourcesConfig,
    years: &[i32],
    refresh: bool,
    progress: Option<&ProgressBar>,
) -> Result<Vec<YearSummary>, PipelineError> {
    if years.is_empty() {
        return Ok(Vec::new());
    }

    let source = sources.datatran_source()?;
    let client = DatatranClient::new(Duration::from_secs(sources.timeout_seconds))?;
    let download_dir = sources
        .download_dir
        .clone()
        .unwrap_or_else(cache_manager::default_download_dir);

    if let Some(pb) = progress {
        pb.set_length(years.len() as u64);
        pb.set_message(format!(
            "Fetching {} archives ({} concurrent)...",
            years.len(),
            sources.concurrency
        ));
    }

    let mut summaries: Vec<YearSummary> = stream::iter(years.iter().copied())
        .map(|year| {
            let client = &client;
            let source = &source;
            let download_dir = &download_dir;
            async move {
                let path = client
                    .fetch_archive(source, year, download_dir, refresh)
                    .await?;
                let summary =
                    tokio::task::spawn_blocking(move || summarize_archive(year, &path)).await??;
                Ok::<_, PipelineError>(summary)
            }
        })
        .buffer_unordered(sources.concurrency.max(1))
        .inspect_ok(|summary| {
            if let Some(pb) = progress {
                pb.inc(1);
                pb.set_message(format!("datatran{}", summary.year));
            }
        })
        .try_collect()
        .await?;

    summaries.sort_by_key(|s| s.year);
    Ok(summaries)
}

/// Monthly PRF accident summary for the configured years.
///
/// Years already in the cache are read from it unless a refresh is forced;
/// the rest are fetched and stored in the cache.
pub(crate) async fn load_accidents(
    sources: &SourcesConfig,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<DataFrame, PipelineError> {
    let cache = if config.use_cache {
        cache_manager::open_cache()
            .inspect_err(|e| warn!("accident cache unavailable, continuing without it: {e}"))
            .ok()
    } else {
        None
    };

    let mut cached_years = Vec::new();
    let mut years_to_fetch = Vec::new();
    for &year in &sources.years {
        let cached = match &cache {
            Some(cache) if !config.force_refresh => cache.has_year(year)?,
            _ => false,
        };
        if cached {
            cached_years.push(year);
        } else {
            years_to_fetch.push(year);
        }
    }
    debug!(?cached_years, ?years_to_fetch, "accident years");

    let fetched = fetch_archives(sources, &years_to_fetch, config.force_refresh, progress).await?;

    if let Some(cache) = &cache {
        for summary in &fetched {
            store_summary(cache, summary);
        }
    }

    let mut frames = Vec::with_capacity(fetched.len() + 1);
    if let Some(cache) = &cache
        && !cached_years.is_empty()
    {
        frames.push(cache.get_years(&cached_years)?.lazy());
    }
    frames.extend(fetched.into_iter().map(|s| s.frame.lazy()));

    if frames.is_empty() {
        return Err(PipelineError::NoAccidentData);
    }

    let combined = concat(frames, UnionArgs::default())?.collect()?;
    info!(
        rows = combined.height(),
        cached = cached_years.len(),
        "loaded PRF accident summary"
    );
    Ok(combined)
}

fn store_summary(cache: &AccidentCache, summary: &YearSummary) {
    let (year, skipped) = (summary.year, summary.skipped_rows);
    if let Err(e) = cache.put_year(year, &summary.frame, &summary.source, skipped) {
        warn!(year, "failed to cache accident summary: {e}");
    }
}

/// Load every dataset the model needs as named source frames.
pub(crate) async fn load_sources(
    sources: &SourcesConfig,
    spec: &ModelSpec,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<Vec<SourceFrame>, PipelineError> {
    let needed = required_sources(spec)?;
    let mut frames = Vec::with_capacity(needed.len());

    for source in needed {
        let frame = match source {
            DataSource::Prf => load_accidents(sources, config, progress).await?,
            DataSource::Renavam => {
                load_fleet(&reference_path(sources.fleet.as_ref(), source, spec)?)?
            }
            DataSource::Ibge => load_gdp(&reference_path(sources.gdp.as_ref(), source, spec)?)?,
            DataSource::DataSus => {
                load_deaths(&reference_path(sources.deaths.as_ref(), source, spec)?)?
            }
        };
        info!(source = %source, rows = frame.height(), "loaded source");
        frames.push(SourceFrame::new(source.name(), frame));
    }

    Ok(frames)
}

fn reference_path(
    path: Option<&PathBuf>,
    source: DataSource,
    spec: &ModelSpec,
) -> Result<PathBuf, PipelineError> {
    path.cloned().ok_or_else(|| {
        let variable = std::iter::once(&spec.response)
            .chain(&spec.predictors)
            .find(|name| get_variable_info(name).is_some_and(|info| info.source == source))
            .cloned()
            .unwrap_or_default();
        PipelineError::MissingSource {
            variable,
            source_name: source.name().to_string(),
        }
    })
}

/// Build one panel per level.
pub(crate) fn build_panels(
    sources: &[SourceFrame],
    resolution: Resolution,
    levels: &[Level],
    strategy: JoinStrategy,
) -> Result<Vec<Panel>, PipelineError> {
    levels
        .iter()
        .map(|&level| Ok(build_panel(sources, resolution, level, strategy)?))
        .collect()
}

/// Fit a partitioned model on every panel.
pub(crate) fn fit_models(
    panels: &[Panel],
    spec: &ModelSpec,
) -> Result<Vec<PartitionedModel>, PipelineError> {
    panels
        .iter()
        .map(|panel| Ok(PartitionedModel::fit(panel, spec)?))
        .collect()
}

/// Print cache location and contents.
pub(crate) fn print_cache_info() {
    let path = cache_manager::default_cache_path();
    println!("  Cache: {}", path.display());
    let line = cache_manager::open_cache()
        .and_then(|cache| cache.get_stats())
        .map_or_else(
            |e| format!("Cache unavailable: {e}"),
            |stats| {
                format!(
                    "Cached: {} years, {} monthly rows",
                    stats.cached_years, stats.summary_rows
                )
            },
        );
    println!("  {line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use transito::panel::columns::{
        ACCIDENTS, DATASUS_DEATHS, FLEET, GDP, MONTH, MOTORCYCLES, STATE, YEAR,
    };

    #[test]
    fn test_required_sources_default_spec() {
        let needed = required_sources(&ModelSpec::default()).unwrap();
        assert_eq!(
            needed.into_iter().collect::<Vec<_>>(),
            vec![
                DataSource::Prf,
                DataSource::Renavam,
                DataSource::Ibge,
                DataSource::DataSus
            ]
        );
    }

    #[rstest]
    #[case(vec![FLEET, MOTORCYCLES], vec![DataSource::Renavam, DataSource::DataSus])]
    #[case(vec![ACCIDENTS], vec![DataSource::Prf, DataSource::DataSus])]
    #[case(vec![GDP], vec![DataSource::Ibge, DataSource::DataSus])]
    fn test_required_sources(#[case] predictors: Vec<&str>, #[case] expected: Vec<DataSource>) {
        let spec = ModelSpec {
            predictors: predictors.into_iter().map(String::from).collect(),
            ..ModelSpec::default()
        };
        let needed: Vec<_> = required_sources(&spec).unwrap().into_iter().collect();
        assert_eq!(needed, expected);
    }

    #[test]
    fn test_unknown_variable() {
        let spec = ModelSpec {
            predictors: vec!["rainfall".to_string()],
            ..ModelSpec::default()
        };
        assert!(matches!(required_sources(&spec), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_reference_path() {
        let spec = ModelSpec::default();
        let err = reference_path(None, DataSource::Ibge, &spec).unwrap_err();
        match err {
            PipelineError::MissingSource {
                variable,
                source_name,
            } => {
                assert_eq!(variable, GDP);
                assert_eq!(source_name, "IBGE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_nothing() {
        let summaries = fetch_archives(&SourcesConfig::default(), &[], false, None)
            .await
            .unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_panels_and_models() {
        let mut year = Vec::new();
        let mut month = Vec::new();
        let mut state = Vec::new();
        let mut fleet = Vec::new();
        let mut deaths = Vec::new();
        for (s, code) in ["RS", "PE"].iter().enumerate() {
            for t in 0..36 {
                let f = 500.0 + 10.0 * f64::from(t) + 100.0 * s as f64 + f64::from(t % 5);
                year.push(2020 + t / 12);
                month.push(t % 12 + 1);
                state.push(*code);
                fleet.push(f);
                deaths.push(1.0 + 0.1 * f + (f64::from(t) * 0.8).sin());
            }
        }
        let frame = |name: &str, values: Vec<f64>| {
            DataFrame::new(vec![
                Column::new(YEAR.into(), year.clone()),
                Column::new(MONTH.into(), month.clone()),
                Column::new(STATE.into(), state.clone()),
                Column::new(name.into(), values),
            ])
            .unwrap()
        };
        let sources = vec![
            SourceFrame::new("RENAVAM", frame(FLEET, fleet)),
            SourceFrame::new("DataSUS", frame(DATASUS_DEATHS, deaths)),
        ];

        let panels = build_panels(
            &sources,
            Resolution::Monthly,
            &[Level::National, Level::State],
            JoinStrategy::Inner,
        )
        .unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].height(), 36);
        assert_eq!(panels[1].height(), 72);

        let spec = ModelSpec {
            predictors: vec![FLEET.to_string()],
            ..ModelSpec::default()
        };
        let models = fit_models(&panels, &spec).unwrap();
        assert_eq!(models[0].len(), 1);
        assert_eq!(models[1].len(), 2);
    }
}
