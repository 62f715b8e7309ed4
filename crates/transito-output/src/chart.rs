//! Inline SVG line charts of observed and predicted series.

use crate::html::escape;
use crate::records::{PredictionRecord, SampleSplit};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 32.0;
const MARGIN_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;

const OBSERVED_COLOR: &str = "#1f2937";
const ESTIMATE_COLOR: &str = "#dc2626";
const BAND_COLOR: &str = "#fca5a5";

/// One x position of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Position on the x axis (period ordinal)
    pub x: f64,
    /// Axis label for this position
    pub label: String,
    /// Observed value
    pub observed: f64,
    /// Predicted value
    pub estimate: f64,
    /// Lower interval bound
    pub lower: f64,
    /// Upper interval bound
    pub upper: f64,
}

/// Observed series with predictions and their interval band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    /// Chart title
    pub title: String,
    /// Points sorted by `x`
    pub points: Vec<ChartPoint>,
    /// First `x` of the test part, drawn as a vertical marker; `None` when
    /// the test part is not a trailing block
    pub split_at: Option<f64>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl LineChart {
    /// Create an empty chart with the default size.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            points: Vec::new(),
            split_at: None,
            width: 720,
            height: 320,
        }
    }

    /// Build a chart from one partition's prediction records.
    ///
    /// Records are sorted by ordinal. The split marker sits at the first
    /// test record, and only when every test record follows every training
    /// record, as in a chronological split. Randomly drawn test rows get no
    /// marker.
    pub fn from_records(title: impl Into<String>, records: &[PredictionRecord]) -> Self {
        let mut records: Vec<&PredictionRecord> = records.iter().collect();
        records.sort_by_key(|r| r.ordinal);

        let first_test = records.iter().position(|r| r.split == SampleSplit::Test);
        let split_at = first_test
            .filter(|&i| records[i..].iter().all(|r| r.split == SampleSplit::Test))
            .map(|i| f64::from(records[i].ordinal));

        let points = records
            .into_iter()
            .map(|r| ChartPoint {
                x: f64::from(r.ordinal),
                label: r.period.clone(),
                observed: r.observed,
                estimate: r.estimate,
                lower: r.lower,
                upper: r.upper,
            })
            .collect();

        Self {
            points,
            split_at,
            ..Self::new(title)
        }
    }

    /// Whether there is nothing to plot.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn x_range(&self) -> (f64, f64) {
        let min = self
            .points
            .iter()
            .map(|p| p.x)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        widen(min, max)
    }

    fn y_range(&self) -> (f64, f64) {
        let values = self
            .points
            .iter()
            .flat_map(|p| [p.observed, p.estimate, p.lower, p.upper])
            .filter(|v| v.is_finite());
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min > max {
            return (0.0, 1.0);
        }
        let pad = (max - min) * 0.05;
        widen(min - pad, max + pad)
    }

    /// Render the chart as a standalone `<svg>` element.
    pub fn to_svg(&self) -> String {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let mut svg = String::new();

        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"#,
            w = self.width,
            h = self.height
        );
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="20" text-anchor="middle" font-size="14" font-weight="bold">{}</text>"#,
            width / 2.0,
            escape(&self.title)
        );

        if self.is_empty() {
            let _ = write!(
                svg,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="#6b7280">no data</text></svg>"##,
                width / 2.0,
                height / 2.0
            );
            return svg;
        }

        let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();
        let sx = |x: f64| MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_w;
        let sy = |y: f64| MARGIN_TOP + plot_h - (y - y_min) / (y_max - y_min) * plot_h;

        // axes
        let _ = write!(
            svg,
            r##"<g stroke="#9ca3af" stroke-width="1"><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}"/><line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}"/></g>"##,
            l = MARGIN_LEFT,
            r = MARGIN_LEFT + plot_w,
            t = MARGIN_TOP,
            b = MARGIN_TOP + plot_h
        );
        for i in 0..=Y_TICKS {
            let value = y_min + (y_max - y_min) * i as f64 / Y_TICKS as f64;
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{}</text>"#,
                MARGIN_LEFT - 6.0,
                sy(value) + 3.0,
                format_tick(value)
            );
        }
        for p in self.x_labels() {
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
                sx(p.x),
                MARGIN_TOP + plot_h + 16.0,
                escape(&p.label)
            );
        }

        // interval band: upper edge left to right, lower edge back
        let band: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("{:.1},{:.1}", sx(p.x), sy(p.upper)))
            .chain(
                self.points
                    .iter()
                    .rev()
                    .map(|p| format!("{:.1},{:.1}", sx(p.x), sy(p.lower))),
            )
            .collect();
        let _ = write!(
            svg,
            r#"<polygon points="{}" fill="{BAND_COLOR}" fill-opacity="0.4" stroke="none"/>"#,
            band.join(" ")
        );

        let line = |value: fn(&ChartPoint) -> f64| -> String {
            self.points
                .iter()
                .map(|p| format!("{:.1},{:.1}", sx(p.x), sy(value(p))))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{OBSERVED_COLOR}" stroke-width="1.5"/>"#,
            line(|p| p.observed)
        );
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{ESTIMATE_COLOR}" stroke-width="1.5" stroke-dasharray="4 2"/>"#,
            line(|p| p.estimate)
        );

        if let Some(split) = self.split_at {
            let x = sx(split);
            let _ = write!(
                svg,
                r##"<line class="split" x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="#2563eb" stroke-dasharray="2 2"/>"##,
                MARGIN_TOP,
                MARGIN_TOP + plot_h
            );
        }

        let _ = write!(
            svg,
            r#"<g font-size="10"><text x="{:.1}" y="{:.1}" fill="{OBSERVED_COLOR}">observed</text><text x="{:.1}" y="{:.1}" fill="{ESTIMATE_COLOR}">predicted</text></g>"#,
            MARGIN_LEFT + 8.0,
            MARGIN_TOP + 12.0,
            MARGIN_LEFT + 72.0,
            MARGIN_TOP + 12.0
        );

        svg.push_str("</svg>");
        svg
    }

    /// At most eight evenly spaced points to label on the x axis.
    fn x_labels(&self) -> Vec<&ChartPoint> {
        let step = self.points.len().div_ceil(8).max(1);
        self.points.iter().step_by(step).collect()
    }
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}
