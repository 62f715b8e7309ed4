//! Transito CLI binary.
//!
//! Builds regression reports on Brazilian traffic deaths from PRF accident
//! archives and the fleet, GDP and DataSUS reference datasets.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager;
use integration::config::{Config, DEFAULT_CONFIG_FILE};
use integration::data_pipeline::{
    FetchConfig, build_panels, fetch_archives, fit_models, load_sources, print_cache_info,
};
use integration::error::PipelineError;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use transito::geo::{Level, Region, State};
use transito::model::PartitionedModel;
use transito::output::{
    ExportFormat, Exporter, ModelSummary, ReportBuilder, coefficient_records, metrics_records,
    prediction_records,
};
use transito::panel::{DataSource, Panel, Resolution, variables_by_source};

#[derive(Parser)]
#[command(name = "transito")]
#[command(about = "Transito: regression reports on Brazilian traffic deaths", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and write the HTML report
    Report {
        /// Configuration file (defaults to ./transito.toml when present)
        #[arg(long, env = "TRANSITO_CONFIG")]
        config: Option<PathBuf>,

        /// Geographic level: national, regional, state or all
        #[arg(long)]
        level: Option<String>,

        /// Period resolution: monthly, quarterly or annual
        #[arg(long)]
        resolution: Option<String>,

        /// HTML output path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write prediction, metric and coefficient exports to this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Disable caching (always parse the archives)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh of downloaded archives and cached summaries
        #[arg(long)]
        refresh: bool,
    },

    /// Download and cache PRF accident archives
    Fetch {
        /// Configuration file
        #[arg(long, env = "TRANSITO_CONFIG")]
        config: Option<PathBuf>,

        /// Years to fetch, e.g. `2017-2023` or `2019,2021`
        #[arg(long)]
        years: Option<String>,

        /// Re-download archives already present
        #[arg(long)]
        refresh: bool,
    },

    /// List federative units and regions
    States {
        /// Only list the units of one region (N, NE, CO, SE, S or its name)
        #[arg(long)]
        region: Option<String>,
    },

    /// List the variables a model can use, grouped by source
    Variables {
        /// Only list the variables of one source (PRF, RENAVAM, IBGE or DataSUS)
        #[arg(long)]
        source: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Output path
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },

    /// Inspect or clear the accident cache
    Cache {
        /// Show cache location and contents
        #[arg(long)]
        info: bool,

        /// Remove every cached year
        #[arg(long, conflicts_with = "info")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Report {
            config,
            level,
            resolution,
            output,
            export_dir,
            no_cache,
            refresh,
        } => {
            let mut config = Config::load_or_default(config.as_deref())?;
            if let Some(level) = level {
                config.report.levels = parse_levels(&level)?;
            }
            if let Some(resolution) = resolution {
                config.panel.resolution = resolution.parse::<Resolution>()?;
            }
            if let Some(output) = output {
                config.report.output = output;
            }
            if export_dir.is_some() {
                config.report.export_dir = export_dir;
            }
            config.validate()?;

            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            generate_report(&config, &fetch, quiet).await?;
        }
        Commands::Fetch {
            config,
            years,
            refresh,
        } => {
            let config = Config::load_or_default(config.as_deref())?;
            let years = match years {
                Some(years) => parse_years(&years)?,
                None => config.sources.years.clone(),
            };
            fetch_data(&config, &years, refresh, quiet).await?;
        }
        Commands::States { region } => list_states(region.as_deref())?,
        Commands::Variables { source } => list_variables(source.as_deref())?,
        Commands::InitConfig { output } => init_config(&output)?,
        Commands::Cache { info, clear } => {
            if clear {
                let cache = cache_manager::open_cache()?;
                cache.clear_all()?;
                println!("Cleared {}", cache_manager::default_cache_path().display());
            }
            if info || !clear {
                println!("Accident cache:");
                print_cache_info();
            }
        }
    }

    Ok(())
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn generate_report(
    config: &Config,
    fetch: &FetchConfig,
    quiet: bool,
) -> Result<(), PipelineError> {
    let pb = progress_bar(quiet);
    pb.set_message("Loading sources...");
    let sources = load_sources(&config.sources, &config.model, fetch, Some(&pb)).await;
    let message = sources.as_ref().map_or_else(
        |_| "Failed!".to_string(),
        |frames| format!("Loaded {} sources", frames.len()),
    );
    pb.finish_with_message(message);
    let sources = sources?;

    let panels = build_panels(
        &sources,
        config.panel.resolution,
        &config.report.levels,
        config.panel.join,
    )?;
    let models = fit_models(&panels, &config.model)?;

    if !quiet {
        for model in &models {
            print!("{}", ModelSummary::from_model(model).to_ascii_table());
        }
    }

    write_report(config, &panels, &models)?;
    println!("Report written to {}", config.report.output.display());

    if let Some(dir) = &config.report.export_dir {
        let format = config.report.export_format.parse::<ExportFormat>()?;
        write_exports(dir, format, &models)?;
        println!("Exports written to {}", dir.display());
    }

    Ok(())
}

fn write_report(
    config: &Config,
    panels: &[Panel],
    models: &[PartitionedModel],
) -> Result<(), PipelineError> {
    let spec = &config.model;
    let years = match (config.sources.years.first(), config.sources.years.last()) {
        (Some(first), Some(last)) => format!("{first}-{last}"),
        _ => "none".to_string(),
    };

    let mut builder = ReportBuilder::new()
        .title(config.report.title.clone())
        .parameter("Response", &spec.response)
        .parameter("Predictors", spec.predictors.join(", "))
        .parameter("Resolution", config.panel.resolution)
        .parameter("Join", config.panel.join)
        .parameter("Train fraction", spec.train_fraction)
        .parameter("Interval", spec.interval)
        .parameter("Confidence level", spec.ols.confidence_level)
        .parameter("PRF years", years);

    for panel in panels {
        builder = builder.coverage(panel);
    }
    for model in models {
        builder = builder.model(model);
    }

    let report = builder.build()?;
    if let Some(parent) = config.report.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    report.write_html(&config.report.output)?;
    info!(path = %config.report.output.display(), "wrote report");
    Ok(())
}

fn write_exports(
    dir: &Path,
    format: ExportFormat,
    models: &[PartitionedModel],
) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir)?;
    let ext = format.extension();

    for model in models {
        let level = model.level.name();
        prediction_records(model)
            .export_to_file(&dir.join(format!("predictions_{level}.{ext}")), format)?;
        metrics_records(model).export_to_file(&dir.join(format!("metrics_{level}.{ext}")), format)?;
        coefficient_records(model)
            .export_to_file(&dir.join(format!("coefficients_{level}.{ext}")), format)?;
        let summary = ModelSummary::from_model(model).to_markdown();
        std::fs::write(dir.join(format!("summary_{level}.md")), summary)?;
    }
    Ok(())
}

async fn fetch_data(
    config: &Config,
    years: &[i32],
    refresh: bool,
    quiet: bool,
) -> Result<(), PipelineError> {
    let pb = progress_bar(quiet);
    let summaries = fetch_archives(&config.sources, years, refresh, Some(&pb)).await;
    let message = summaries.as_ref().map_or_else(
        |_| "Failed!".to_string(),
        |s| format!("Fetched {} archives", s.len()),
    );
    pb.finish_with_message(message);
    let summaries = summaries?;

    let cache = cache_manager::open_cache()?;
    for summary in &summaries {
        cache.put_year(
            summary.year,
            &summary.frame,
            &summary.source,
            summary.skipped_rows,
        )?;
        println!(
            "  {}: {} monthly rows ({} unparseable records skipped)",
            summary.year,
            summary.frame.height(),
            summary.skipped_rows
        );
    }
    Ok(())
}

fn list_states(region: Option<&str>) -> Result<(), PipelineError> {
    let regions = match region {
        Some(value) => vec![
            Region::parse(value)
                .ok_or_else(|| PipelineError::Config(format!("unknown region '{value}'")))?,
        ],
        None => Region::all(),
    };

    for region in regions {
        println!("{} ({})", region.name(), region.code());
        for state in region.states() {
            println!(
                "  {}  {:2}  {}",
                state.code(),
                state.ibge_code(),
                state.name()
            );
        }
    }
    if region.is_none() {
        println!("\n{} federative units", State::all().len());
    }
    Ok(())
}

fn list_variables(source: Option<&str>) -> Result<(), PipelineError> {
    let sources = match source {
        Some(value) => vec![
            DataSource::parse(value)
                .ok_or_else(|| PipelineError::Config(format!("unknown source '{value}'")))?,
        ],
        None => DataSource::all(),
    };

    for source in sources {
        println!("{source}");
        for variable in variables_by_source(source) {
            println!(
                "  {:<16} {:<5}  {}",
                variable.name,
                variable.kind.name(),
                variable.description
            );
        }
    }
    Ok(())
}

fn init_config(path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        return Err(PipelineError::Config(format!(
            "{} already exists; remove it first or edit it",
            path.display()
        )));
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

/// Parse `all` or a single level name.
fn parse_levels(value: &str) -> Result<Vec<Level>, PipelineError> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(Level::all());
    }
    value
        .parse::<Level>()
        .map(|level| vec![level])
        .map_err(|e| PipelineError::Config(e.to_string()))
}

/// Parse `2017-2023`, `2019` or `2017,2019,2021`.
fn parse_years(value: &str) -> Result<Vec<i32>, PipelineError> {
    let invalid = || PipelineError::Config(format!("invalid years '{value}'"));
    let mut years = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start: i32 = start.trim().parse().map_err(|_| invalid())?;
            let end: i32 = end.trim().parse().map_err(|_| invalid())?;
            if start > end {
                return Err(invalid());
            }
            years.extend(start..=end);
        } else {
            years.push(part.parse().map_err(|_| invalid())?);
        }
    }

    if years.is_empty() {
        return Err(invalid());
    }
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("2017-2019", vec![2017, 2018, 2019])]
    #[case("2021", vec![2021])]
    #[case("2019, 2017,2019", vec![2017, 2019])]
    #[case("2016-2017,2020", vec![2016, 2017, 2020])]
    fn test_parse_years(#[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(parse_years(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("2020-2019")]
    #[case("twenty")]
    fn test_parse_years_invalid(#[case] input: &str) {
        assert!(parse_years(input).is_err());
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(parse_levels("all").unwrap().len(), 3);
        assert_eq!(parse_levels("regional").unwrap(), vec![Level::Regional]);
        assert!(parse_levels("municipal").is_err());
    }

    #[test]
    fn test_report_args() {
        let cli = Cli::try_parse_from([
            "transito",
            "-vv",
            "report",
            "--level",
            "state",
            "--resolution",
            "annual",
            "--no-cache",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Report {
                level,
                resolution,
                no_cache,
                refresh,
                ..
            } => {
                assert_eq!(level.as_deref(), Some("state"));
                assert_eq!(resolution.as_deref(), Some("annual"));
                assert!(no_cache);
                assert!(!refresh);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_variables_args() {
        let cli = Cli::try_parse_from(["transito", "variables", "--source", "ibge"]).unwrap();
        match cli.command {
            Commands::Variables { source } => assert_eq!(source.as_deref(), Some("ibge")),
            _ => panic!("expected variables command"),
        }
        assert!(list_variables(Some("IBGE")).is_ok());
        assert!(list_variables(Some("detran")).is_err());
    }

    #[test]
    fn test_cache_flags_conflict() {
        assert!(Cli::try_parse_from(["transito", "cache", "--info", "--clear"]).is_err());
    }
}
