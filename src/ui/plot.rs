use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::series::ESTIMATE_RANGE;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

/// Label for an integer tick on a categorical axis.
fn category_label(categories: &[String], value: f64) -> String {
    if value.fract() != 0.0 || value < 0.0 {
        return String::new();
    }
    categories.get(value as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Line graph: estimate by birth year
// ---------------------------------------------------------------------------

/// Render one line per geographic area over the birth-year axis.
pub fn line_graph(ui: &mut Ui, state: &AppState) {
    let chart = &state.line;
    if chart.series.is_empty() {
        ui.label("No data available for this selection.");
        return;
    }

    let colors = ColorMap::new(chart.series.iter().map(|s| s.name.as_str()));
    let years = chart.birth_years.clone();

    Plot::new("line_graph")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Birth Year")
        .y_axis_label("Estimate (%)")
        .include_y(ESTIMATE_RANGE.0)
        .include_y(ESTIMATE_RANGE.1)
        .x_axis_formatter(move |mark, _range| category_label(&years, mark.value))
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let points: Vec<[f64; 2]> = series
                    .points
                    .iter()
                    .filter_map(|(year, estimate)| {
                        let x = chart.birth_years.iter().position(|y| y == year)?;
                        Some([x as f64, (*estimate)?])
                    })
                    .collect();
                let color = colors.color_for(&series.name);

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(&series.name)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(&series.name)
                        .color(color)
                        .radius(3.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Grouped bar chart: estimate by sociodemographic category
// ---------------------------------------------------------------------------

/// Render one bar group per birth cohort, categories in the factor's
/// preferred order.
pub fn bar_chart(ui: &mut Ui, state: &AppState) {
    let Some(chart) = state.bars.as_ref().filter(|c| !c.groups.is_empty()) else {
        ui.label("No sociodemographic data available for this selection.");
        return;
    };

    let colors = ColorMap::new(chart.groups.iter().map(|g| g.cohort.as_str()));
    let categories = chart.categories.clone();
    let n_groups = chart.groups.len() as f64;
    let width = 0.8 / n_groups;

    Plot::new("bar_chart")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(chart.factor.label())
        .y_axis_label("Estimate (%)")
        .include_y(ESTIMATE_RANGE.0)
        .include_y(ESTIMATE_RANGE.1)
        .x_axis_formatter(move |mark, _range| category_label(&categories, mark.value))
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            for (gi, group) in chart.groups.iter().enumerate() {
                let offset = (gi as f64 - (n_groups - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = group
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(ci, value)| {
                        let value = (*value)?;
                        Some(
                            Bar::new(ci as f64 + offset, value)
                                .width(width)
                                .name(format!("{} ({})", chart.categories[ci], group.cohort)),
                        )
                    })
                    .collect();

                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(&group.cohort)
                        .color(colors.color_for(&group.cohort)),
                );
            }
        });
}
