//! HTML report generation.
//!
//! A [`Report`] is a list of sections, each a list of [`Block`]s. The
//! [`ReportBuilder`] turns panels and partitioned models into sections; the
//! report then renders to one self-contained HTML page or to JSON.

use crate::chart::LineChart;
use crate::html::escape;
use crate::records::{metrics_records, partition_predictions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;
use transito_model::PartitionedModel;
use transito_panel::{Panel, SplitStrategy};

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing was added to the report.
    #[error("Report has no sections")]
    Empty,
}

/// A table with an optional caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Caption shown above the table
    pub caption: Option<String>,
    /// Column headers
    pub headers: Vec<String>,
    /// Cell text, row by row
    pub rows: Vec<Vec<String>>,
}

/// A unit of report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Block {
    /// Free text
    Paragraph(String),
    /// Definition list of names and values
    KeyValues(Vec<(String, String)>),
    /// Tabular data
    Table(Table),
    /// Line chart
    Chart(LineChart),
}

/// A titled group of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading
    pub heading: String,
    /// Section content in order
    pub blocks: Vec<Block>,
}

impl Section {
    /// Create an empty section.
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    /// Append a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }
}

/// A rendered regression report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title.
    pub title: String,

    /// Generation time.
    pub generated_at: DateTime<Utc>,

    /// Report sections in order.
    pub sections: Vec<Section>,
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:960px;color:#111827}\
table{border-collapse:collapse;margin:1em 0}\
th,td{border:1px solid #d1d5db;padding:4px 8px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
caption{font-weight:bold;text-align:left;padding:4px 0}\
dl{display:grid;grid-template-columns:max-content auto;gap:2px 12px}\
dt{font-weight:bold}dd{margin:0}figure{margin:1em 0}";

impl Report {
    /// Create a report stamped with the current time.
    pub fn new(title: String, sections: Vec<Section>) -> Self {
        Self {
            title,
            generated_at: Utc::now(),
            sections,
        }
    }

    /// Serialize the report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as one self-contained HTML page.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let title = escape(&self.title);

        html.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{title}</title>");
        let _ = writeln!(html, "<style>{STYLE}</style>");
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<h1>{title}</h1>");
        let _ = writeln!(
            html,
            "<p class=\"generated\">Generated {}</p>",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for section in &self.sections {
            html.push_str("<section>\n");
            let _ = writeln!(html, "<h2>{}</h2>", escape(&section.heading));
            for block in &section.blocks {
                render_block(&mut html, block);
            }
            html.push_str("</section>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Write the HTML rendering to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_html(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.to_html())?;
        Ok(())
    }
}

fn render_block(html: &mut String, block: &Block) {
    match block {
        Block::Paragraph(text) => {
            let _ = writeln!(html, "<p>{}</p>", escape(text));
        }
        Block::KeyValues(pairs) => {
            html.push_str("<dl>\n");
            for (key, value) in pairs {
                let _ = writeln!(html, "<dt>{}</dt><dd>{}</dd>", escape(key), escape(value));
            }
            html.push_str("</dl>\n");
        }
        Block::Table(table) => {
            html.push_str("<table>\n");
            if let Some(caption) = &table.caption {
                let _ = writeln!(html, "<caption>{}</caption>", escape(caption));
            }
            html.push_str("<thead><tr>");
            for header in &table.headers {
                let _ = write!(html, "<th>{}</th>", escape(header));
            }
            html.push_str("</tr></thead>\n<tbody>\n");
            for row in &table.rows {
                html.push_str("<tr>");
                for cell in row {
                    let _ = write!(html, "<td>{}</td>", escape(cell));
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</tbody>\n</table>\n");
        }
        Block::Chart(chart) => {
            html.push_str("<figure>");
            html.push_str(&chart.to_svg());
            html.push_str("</figure>\n");
        }
    }
}

/// Format a statistic, showing undefined values as `n/a`.
fn num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "n/a".to_string()
    }
}

/// Builder for assembling reports from pipeline results.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    parameters: Vec<(String, String)>,
    coverage: Vec<Block>,
    sections: Vec<Section>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Record one run parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.push((name.into(), value.to_string()));
        self
    }

    /// Record the row counts and period range of a panel.
    pub fn coverage(mut self, panel: &Panel) -> Self {
        let report = &panel.join_report;
        let dropped = report.dropped_rows();

        let mut rows: Vec<Vec<String>> = report
            .inputs
            .iter()
            .zip(&dropped)
            .map(|(input, (_, dropped))| {
                let rows = input.rows.to_string();
                vec![input.name.clone(), rows, dropped.to_string()]
            })
            .collect();
        rows.push(vec![
            "joined".to_string(),
            report.output_rows.to_string(),
            String::new(),
        ]);

        let range = match panel.period_range() {
            Ok(Some((first, last))) => format!(", {first} to {last}"),
            _ => String::new(),
        };

        self.coverage.push(Block::Table(Table {
            caption: Some(format!(
                "{} panel ({}, {} join{range})",
                panel.level, panel.resolution, report.strategy
            )),
            headers: vec![
                "Source".to_string(),
                "Rows".to_string(),
                "Not joined".to_string(),
            ],
            rows,
        }));
        self
    }

    /// Add the metrics, coefficients, charts and skipped partitions of a
    /// partitioned model as one section.
    pub fn model(mut self, model: &PartitionedModel) -> Self {
        let mut section = Section::new(format!(
            "{} model ({})",
            capitalize(model.level.name()),
            model.resolution
        ));

        section.push(Block::Paragraph(format!(
            "Response {} regressed on {} with {} intervals; \
             {:.0}% of each partition's periods train the model ({} split).",
            model.spec.response,
            model.spec.predictors.join(", "),
            model.spec.interval,
            model.spec.train_fraction * 100.0,
            split_name(model),
        )));

        let metrics_rows = metrics_records(model)
            .into_iter()
            .map(|m| {
                vec![
                    m.partition,
                    m.split.to_string(),
                    m.n.to_string(),
                    num(m.rmse, 2),
                    num(m.mae, 2),
                    num(m.rsq, 4),
                    num(m.rsq_trad, 4),
                ]
            })
            .collect();
        section.push(Block::Table(Table {
            caption: Some("Accuracy".to_string()),
            headers: ["Partition", "Split", "n", "RMSE", "MAE", "R²", "R² (trad.)"]
                .map(String::from)
                .to_vec(),
            rows: metrics_rows,
        }));

        for fit in model.fits.values() {
            let label = fit.partition.description();
            let coefficient_rows = fit
                .fit
                .coefficients
                .iter()
                .map(|c| {
                    vec![
                        c.term.clone(),
                        num(c.estimate, 4),
                        num(c.std_error, 4),
                        num(c.t_value, 3),
                        num(c.p_value, 4),
                        format!("[{}, {}]", num(c.ci_lower, 4), num(c.ci_upper, 4)),
                    ]
                })
                .collect();
            section.push(Block::Table(Table {
                caption: Some(format!(
                    "{label}: R² {}, residual SE {}",
                    num(fit.fit.r_squared, 4),
                    num(fit.fit.residual_std_error, 2)
                )),
                headers: ["Term", "Estimate", "Std. error", "t", "p", "CI"]
                    .map(String::from)
                    .to_vec(),
                rows: coefficient_rows,
            }));

            if !fit.normalizer.dropped().is_empty() {
                section.push(Block::Paragraph(format!(
                    "{label}: predictors constant in the training periods and left out: {}.",
                    fit.normalizer.dropped().join(", ")
                )));
            }

            let records = partition_predictions(model.level, fit);
            let title = format!("{label}: {}", model.spec.response);
            let mut chart = LineChart::from_records(title, &records);
            if matches!(model.spec.split, SplitStrategy::Random { .. }) {
                chart.split_at = None;
            }
            section.push(Block::Chart(chart));
        }

        if !model.skipped.is_empty() {
            section.push(Block::Table(Table {
                caption: Some("Skipped partitions".to_string()),
                headers: vec!["Partition".to_string(), "Reason".to_string()],
                rows: model
                    .skipped
                    .iter()
                    .map(|s| vec![s.partition.description(), s.reason.clone()])
                    .collect(),
            }));
        }

        self.sections.push(section);
        self
    }

    /// Append a custom section.
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Build the report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Empty`] when nothing was added.
    pub fn build(self) -> Result<Report, ReportError> {
        let mut sections = Vec::new();
        if !self.parameters.is_empty() {
            let mut section = Section::new("Parameters");
            section.push(Block::KeyValues(self.parameters));
            sections.push(section);
        }
        if !self.coverage.is_empty() {
            sections.push(Section {
                heading: "Data coverage".to_string(),
                blocks: self.coverage,
            });
        }
        sections.extend(self.sections);

        if sections.is_empty() {
            return Err(ReportError::Empty);
        }

        Ok(Report::new(
            self.title
                .unwrap_or_else(|| "Traffic deaths regression report".to_string()),
            sections,
        ))
    }
}

fn split_name(model: &PartitionedModel) -> String {
    match model.spec.split {
        SplitStrategy::Chronological => "chronological".to_string(),
        SplitStrategy::Random { seed } => format!("random, seed {seed}"),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    let first = chars.next().map(char::to_uppercase);
    first.into_iter().flatten().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_content() {
        assert!(matches!(ReportBuilder::new().build(), Err(ReportError::Empty)));
    }

    #[test]
    fn test_parameters_section() {
        let report = ReportBuilder::new()
            .title("Mortes <2024>")
            .parameter("resolution", "quarterly")
            .parameter("train fraction", 0.8)
            .build()
            .unwrap();

        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].heading, "Parameters");

        let html = report.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Mortes &lt;2024&gt;</h1>"));
        assert!(html.contains("<dt>train fraction</dt><dd>0.8</dd>"));
    }

    #[test]
    fn test_table_and_chart_rendering() {
        let mut section = Section::new("Extra");
        section.push(Block::Table(Table {
            caption: Some("t".to_string()),
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec!["1".to_string(), "x & y".to_string()]],
        }));
        section.push(Block::Chart(LineChart::new("empty")));

        let html = ReportBuilder::new()
            .section(section)
            .build()
            .unwrap()
            .to_html();
        assert!(html.contains("<th>a</th><th>b</th>"));
        assert!(html.contains("<td>x &amp; y</td>"));
        assert!(html.contains("<figure><svg"));
    }

    #[test]
    fn test_json_block_tags() {
        let mut section = Section::new("s");
        section.push(Block::Paragraph("hello".to_string()));
        let json = ReportBuilder::new()
            .section(section)
            .build()
            .unwrap()
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sections"][0]["blocks"][0]["type"], "paragraph");
        assert_eq!(value["sections"][0]["blocks"][0]["content"], "hello");
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(1.23456, 2), "1.23");
        assert_eq!(num(f64::NAN, 2), "n/a");
        assert_eq!(capitalize("regional"), "Regional");
    }
}
