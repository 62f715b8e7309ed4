//! Integration tests for records, exports and the HTML report.

use polars::prelude::*;
use transito_geo::Level;
use transito_model::{IntervalKind, ModelSpec, PartitionedModel};
use transito_output::{
    Block, ExportFormat, Exporter, LineChart, ModelSummary, ReportBuilder, SampleSplit,
    coefficient_records, metrics_records, prediction_records,
};
use transito_panel::columns::{DATASUS_DEATHS, FLEET, GDP, MONTH, STATE, YEAR};
use transito_panel::{JoinStrategy, Panel, Resolution, SourceFrame, SplitStrategy, build_panel};

fn panel(level: Level) -> Panel {
    let mut year = Vec::new();
    let mut month = Vec::new();
    let mut state = Vec::new();
    let mut fleet = Vec::new();
    let mut gdp = Vec::new();
    let mut deaths = Vec::new();

    for (s, code) in ["SP", "BA"].iter().enumerate() {
        for t in 0..48 {
            let f = 2000.0 + 40.0 * f64::from(t) + 500.0 * s as f64;
            let g = 50.0 + (f64::from(t) * 0.9).sin() * 4.0;
            year.push(2018 + t / 12);
            month.push(t % 12 + 1);
            state.push(*code);
            fleet.push(f);
            gdp.push(g);
            deaths.push(3.0 + 0.02 * f + g + (f64::from(t) * 2.1).cos());
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
        SourceFrame::new("renavam", frame(FLEET, fleet)),
        SourceFrame::new("ibge", frame(GDP, gdp)),
        SourceFrame::new("datasus", frame(DATASUS_DEATHS, deaths)),
    ];
    build_panel(&sources, Resolution::Quarterly, level, JoinStrategy::Inner).unwrap()
}

fn model(panel: &Panel) -> PartitionedModel {
    let spec = ModelSpec {
        predictors: vec![FLEET.to_string(), GDP.to_string()],
        interval: IntervalKind::Confidence,
        ..ModelSpec::default()
    };
    PartitionedModel::fit(panel, &spec).unwrap()
}

#[test]
fn test_records_from_regional_model() {
    let panel = panel(Level::Regional);
    let model = model(&panel);
    assert_eq!(model.len(), 2);
    assert_eq!(model.skipped.len(), 3);

    let predictions = prediction_records(&model);
    assert_eq!(predictions.len(), 32);
    for p in &predictions {
        assert!(p.estimate.is_finite() && p.lower.is_finite() && p.upper.is_finite());
        assert!(p.lower <= p.estimate && p.estimate <= p.upper);
    }
    let test_rows = predictions
        .iter()
        .filter(|p| p.split == SampleSplit::Test)
        .count();
    assert_eq!(test_rows, 6);

    let metrics = metrics_records(&model);
    assert_eq!(metrics.len(), 4);

    // intercept plus two predictors per region
    assert_eq!(coefficient_records(&model).len(), 6);
}

#[test]
fn test_exports() {
    let model = model(&panel(Level::National));

    let csv = prediction_records(&model)
        .export_to_string(ExportFormat::Csv)
        .unwrap();
    assert!(csv.starts_with("level,partition,period,ordinal,split,observed,estimate,lower,upper"));
    assert_eq!(csv.lines().count(), 17);
    assert!(csv.contains("national,Brasil,2018Q1,"));

    let json = coefficient_records(&model)
        .export_to_string(ExportFormat::PrettyJson)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["term"], "(Intercept)");
}

#[test]
fn test_summary_table() {
    let model = model(&panel(Level::Regional));
    let summary = ModelSummary::from_model(&model);
    assert_eq!(summary.partitions.len(), 2);
    assert_eq!(summary.skipped.len(), 3);

    let table = summary.to_ascii_table();
    assert!(table.contains("Sudeste"));
    assert!(table.contains("Nordeste"));
}

#[test]
fn test_full_report() {
    let national = panel(Level::National);
    let regional = panel(Level::Regional);

    let report = ReportBuilder::new()
        .title("Mortes no trânsito")
        .parameter("resolution", Resolution::Quarterly)
        .coverage(&national)
        .coverage(&regional)
        .model(&model(&national))
        .model(&model(&regional))
        .build()
        .unwrap();

    let headings: Vec<&str> = report.sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(
        headings,
        vec![
            "Parameters",
            "Data coverage",
            "National model (quarterly)",
            "Regional model (quarterly)"
        ]
    );

    let charts = report.sections[3]
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Chart(_)))
        .count();
    assert_eq!(charts, 2);

    let html = report.to_html();
    assert!(html.contains("<h1>Mortes no trânsito</h1>"));
    assert!(html.contains("Skipped partitions"));
    assert!(html.contains("Região Sudeste"));
    assert_eq!(html.matches("<svg").count(), 3);

    let json = report.to_json().unwrap();
    assert!(json.contains("\"generated_at\""));
}

#[test]
fn test_random_split_report_has_no_split_marker() {
    let national = panel(Level::National);
    let spec = ModelSpec {
        predictors: vec![FLEET.to_string(), GDP.to_string()],
        split: SplitStrategy::Random { seed: 7 },
        ..ModelSpec::default()
    };
    let model = PartitionedModel::fit(&national, &spec).unwrap();
    let report = ReportBuilder::new().model(&model).build().unwrap();

    let charts: Vec<&LineChart> = report
        .sections
        .iter()
        .flat_map(|s| &s.blocks)
        .filter_map(|b| match b {
            Block::Chart(chart) => Some(chart),
            _ => None,
        })
        .collect();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].split_at, None);
    assert!(!report.to_html().contains(r#"class="split""#));
}

#[test]
fn test_chart_for_partition() {
    let model = model(&panel(Level::National));
    let records = prediction_records(&model);
    let chart = LineChart::from_records("Brasil", &records);
    assert_eq!(chart.points.len(), 16);
    assert_eq!(chart.split_at, Some(chart.points[13].x));
}
