//! Integration tests from monthly source frames to normalized datasets

use polars::prelude::*;
use transito_geo::{Level, PartitionKey, Region, State};
use transito_panel::columns::{DATASUS_DEATHS, FLEET, GDP, MONTH, STATE, YEAR};
use transito_panel::{
    JoinStrategy, Normalizer, RegressionDataset, Resolution, SourceFrame, SplitStrategy,
    build_panel, split,
};

const STATES: [State; 3] = [State::PR, State::SC, State::RS];

fn monthly_source(
    variable: &str,
    years: std::ops::Range<i32>,
    f: impl Fn(i32, i32, usize) -> f64,
) -> DataFrame {
    let mut y = Vec::new();
    let mut m = Vec::new();
    let mut s = Vec::new();
    let mut v = Vec::new();
    for year in years {
        for month in 1..=12 {
            for (i, state) in STATES.iter().enumerate() {
                y.push(year);
                m.push(month);
                s.push(state.code());
                v.push(f(year, month, i));
            }
        }
    }
    DataFrame::new(vec![
        Column::new(YEAR.into(), y),
        Column::new(MONTH.into(), m),
        Column::new(STATE.into(), s),
        Column::new(variable.into(), v),
    ])
    .unwrap()
}

fn sources() -> Vec<SourceFrame> {
    vec![
        SourceFrame::new(
            "renavam",
            monthly_source(FLEET, 2015..2021, |y, m, i| {
                1000.0 * (i as f64 + 1.0) + f64::from((y - 2015) * 12 + m)
            }),
        ),
        SourceFrame::new(
            "ibge",
            monthly_source(GDP, 2015..2021, |y, m, i| {
                50.0 + f64::from(y - 2015) + f64::from(m % 3) + i as f64
            }),
        ),
        // DataSUS data ends a year earlier
        SourceFrame::new(
            "datasus",
            monthly_source(DATASUS_DEATHS, 2015..2020, |_, m, i| {
                10.0 + f64::from(m) + i as f64
            }),
        ),
    ]
}

#[test]
fn test_quarterly_regional_pipeline() {
    let panel = build_panel(
        &sources(),
        Resolution::Quarterly,
        Level::Regional,
        JoinStrategy::Inner,
    )
    .unwrap();

    // three states, one region, five years of quarters
    assert_eq!(
        panel.partitions().unwrap(),
        vec![PartitionKey::Region(Region::Sul)]
    );
    assert_eq!(panel.height(), 20);
    let report = &panel.join_report;
    assert!(report.inputs.iter().all(|s| report.output_rows <= s.rows));

    let predictors = vec![FLEET.to_string(), GDP.to_string()];
    let dataset = RegressionDataset::from_panel(
        &panel,
        PartitionKey::Region(Region::Sul),
        DATASUS_DEATHS,
        &predictors,
    )
    .unwrap();
    assert_eq!(dataset.len(), 20);
    assert_eq!(dataset.periods[0].label(), "2015Q1");

    let (train, test) = split(&dataset, 0.8, SplitStrategy::Chronological).unwrap();
    assert_eq!(train.len() + test.len(), dataset.len());
    assert_eq!(train.len(), 16);
    assert_eq!(test.periods[0].label(), "2019Q1");

    let normalizer = Normalizer::fit(&train).unwrap();
    let train = normalizer.transform(&train).unwrap();
    let test = normalizer.transform(&test).unwrap();
    assert_eq!(train.n_predictors(), test.n_predictors());

    let column_means = train.predictors.mean_axis(ndarray::Axis(0)).unwrap();
    for mean in column_means.iter() {
        assert!(mean.abs() < 1e-9);
    }
}

#[test]
fn test_full_join_keeps_unmatched_year() {
    let panel = build_panel(
        &sources(),
        Resolution::Annual,
        Level::National,
        JoinStrategy::Full,
    )
    .unwrap();
    assert_eq!(panel.height(), 6);

    let predictors = vec![FLEET.to_string()];
    let dataset =
        RegressionDataset::from_panel(&panel, PartitionKey::National, DATASUS_DEATHS, &predictors)
            .unwrap();
    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.dropped_rows, 1);
}
