//! Chart-ready shapes built from a row subset.
//!
//! The renderers in `ui` only ever see these owned values, so the cached
//! chart data can outlive the borrow of the dataset.

use super::filter::distinct_values;
use super::model::{Column, SocDemFactor, VaccinationRecord};

/// Value axis of every chart, in percent.
pub const ESTIMATE_RANGE: (f64, f64) = (0.0, 100.0);

/// One state tile of the choropleth.
#[derive(Debug, Clone, PartialEq)]
pub struct MapCell {
    pub state: String,
    pub area: String,
    pub estimate: Option<f64>,
    pub sample_size: Option<u64>,
}

/// One line of the birth-year chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    /// (birth year label, estimate) ordered by birth year.
    pub points: Vec<(String, Option<f64>)>,
}

/// Data for the birth-year chart: categorical x axis plus series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineChartData {
    pub birth_years: Vec<String>,
    pub series: Vec<LineSeries>,
}

/// One colour group of the grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub cohort: String,
    /// Estimate per category, aligned with [`BarChartData::categories`].
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartData {
    pub factor: SocDemFactor,
    pub categories: Vec<String>,
    pub groups: Vec<BarGroup>,
}

pub fn map_cells(rows: &[&VaccinationRecord]) -> Vec<MapCell> {
    rows.iter()
        .filter_map(|r| {
            Some(MapCell {
                state: r.state.clone()?,
                area: r.geographic_area.clone(),
                estimate: r.estimate_pct,
                sample_size: r.sample_size,
            })
        })
        .collect()
}

/// Group birth-year rows into one series per geographic area.
///
/// Series appear in first-encountered order; birth years sort as text,
/// which is chronological for four-digit labels.
pub fn line_chart(rows: &[&VaccinationRecord]) -> LineChartData {
    let mut birth_years = distinct_values(rows.iter().copied(), Column::BirthYear, None);
    birth_years.sort();

    let series = distinct_values(rows.iter().copied(), Column::GeographicArea, None)
        .into_iter()
        .map(|name| {
            let mut points: Vec<(String, Option<f64>)> = rows
                .iter()
                .filter(|r| r.geographic_area == name)
                .filter_map(|r| Some((r.birth_year.clone()?, r.estimate_pct)))
                .collect();
            points.sort_by(|a, b| a.0.cmp(&b.0));
            LineSeries { name, points }
        })
        .collect();

    LineChartData {
        birth_years,
        series,
    }
}

/// Group cohort rows by birth cohort with the factor's category order on
/// the x axis.
pub fn bar_chart(rows: &[&VaccinationRecord], factor: SocDemFactor) -> BarChartData {
    let column = factor.column();
    let categories = distinct_values(
        rows.iter().copied(),
        column,
        Some(factor.category_order()),
    );

    let groups = distinct_values(rows.iter().copied(), Column::BirthCohort, None)
        .into_iter()
        .map(|cohort| {
            let values = categories
                .iter()
                .map(|category| {
                    rows.iter()
                        .find(|r| {
                            r.birth_cohort.as_deref() == Some(cohort.as_str())
                                && r.value(column) == Some(category.as_str())
                        })
                        .and_then(|r| r.estimate_pct)
                })
                .collect();
            BarGroup { cohort, values }
        })
        .collect();

    BarChartData {
        factor,
        categories,
        groups,
    }
}
