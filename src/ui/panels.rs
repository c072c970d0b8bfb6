use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::Selection;
use crate::data::model::SocDemFactor;
use crate::state::AppState;
use crate::ui::{bar_title, line_title, map, map_title, plot, ChartTitle};

// ---------------------------------------------------------------------------
// Selector widget
// ---------------------------------------------------------------------------

/// A labelled combo box.  Returns the option the user clicked, if any.
fn selector(
    ui: &mut Ui,
    id: &str,
    label: &str,
    help: &str,
    current: Option<&str>,
    options: &[String],
) -> Option<String> {
    let mut picked = None;
    ui.strong(label).on_hover_text(help);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or("(none)"))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                if ui
                    .selectable_label(current == Some(option.as_str()), option)
                    .clicked()
                {
                    picked = Some(option.clone());
                }
            }
        });
    ui.add_space(4.0);
    picked
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(sel) = state.engine.as_ref().map(|e| e.selection().clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new("Vaccine, dose and age").italics());
            if let Some(v) = selector(
                ui,
                "vaccine",
                "Select Vaccine",
                "Vaccines recommended for children by the time they reach 2 years of age",
                sel.vaccine.as_deref(),
                &state.vaccine_options,
            ) {
                state.select_vaccine(v);
            }
            if let Some(d) = selector(
                ui,
                "dose",
                "Select Dose",
                "Options for dose depend on selected vaccine",
                sel.dose.as_deref(),
                &state.dose_options,
            ) {
                state.select_dose(d);
            }
            if let Some(a) = selector(
                ui,
                "age",
                "Select Age Checkpoint",
                "Options for age checkpoint depend on selected vaccine and dose",
                sel.age.as_deref(),
                &state.age_options,
            ) {
                state.select_age(a);
            }
            ui.separator();

            if let Some(g) = selector(
                ui,
                "geo",
                "Select Geographic Area",
                "Options include: United States, HHS Region, State, Territory, and certain City/County breakouts",
                sel.geographic_area.as_deref(),
                &state.geo_options,
            ) {
                state.select_geographic_area(g);
            }
            hhs_region_map(ui, state);
            ui.separator();

            ui.label(RichText::new("Sociodemographic breakdown").italics());
            let factors: Vec<String> = SocDemFactor::ALL.iter().map(|f| f.label().to_string()).collect();
            if let Some(f) = selector(
                ui,
                "soc_dem_factor",
                "Select Sociodemographic Factor",
                "Available for the 2014-2017 and 2016-2019 birth cohorts only",
                sel.sociodemographic_factor.map(SocDemFactor::label),
                &factors,
            ) {
                if let Ok(factor) = f.parse() {
                    state.select_soc_dem_factor(factor);
                }
            }
            if let Some(d) = selector(
                ui,
                "soc_dem_dose",
                "Select Dose",
                "Not every dose has sociodemographic data",
                sel.sociodemographic_dose.as_deref(),
                &state.soc_dem_dose_options,
            ) {
                state.select_soc_dem_dose(d);
            }
        });
}

/// Button that pops up the HHS region map, when one is configured.
fn hhs_region_map(ui: &mut Ui, state: &AppState) {
    let Some(path) = state.config.hhs_region_map.as_ref().filter(|p| p.exists()) else {
        return;
    };
    ui.menu_button("View Map of HHS Regions", |ui: &mut Ui| {
        ui.add(
            egui::Image::from_uri(format!("file://{}", path.display()))
                .max_width(520.0)
                .rounding(4.0),
        );
        ui.label(
            RichText::new("United States Department of Health and Human Services (HHS) Regions")
                .small(),
        );
    });
}

// ---------------------------------------------------------------------------
// Central panel – the three charts
// ---------------------------------------------------------------------------

fn chart_heading(ui: &mut Ui, title: Option<ChartTitle>) {
    if let Some((main, sub)) = title {
        ui.label(RichText::new(main).strong().size(17.0));
        ui.label(RichText::new(sub).size(14.0));
    }
}

/// Render the dashboard: map, line graph, bar chart.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let Some(sel) = state.engine.as_ref().map(|e| e.selection()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to explore vaccination rates  (File → Open dataset…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Vaccination Rates for Young Children in the United States");
            ui.separator();

            section(ui, "How do child vaccination rates compare across states?", sel, map_title, |ui| {
                map::choropleth(ui, state)
            });
            section(ui, "How do child vaccination rates compare by year of birth?", sel, line_title, |ui| {
                plot::line_graph(ui, state)
            });
            section(
                ui,
                "How do child vaccination rates compare based on sociodemographic factors?",
                sel,
                bar_title,
                |ui| plot::bar_chart(ui, state),
            );
            ui.label(
                RichText::new(
                    "Sociodemographic estimates are only available for the 2014-2017 and \
                     2016-2019 birth cohorts at the 24 month checkpoint.",
                )
                .small(),
            );
        });
}

fn section(
    ui: &mut Ui,
    question: &str,
    sel: &Selection,
    title: fn(&Selection) -> Option<ChartTitle>,
    body: impl FnOnce(&mut Ui),
) {
    ui.add_space(8.0);
    ui.heading(question);
    chart_heading(ui, title(sel));
    body(ui);
    ui.separator();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open geographic order…").clicked() {
                open_geo_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.load_configured();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(engine) = &state.engine {
            ui.label(format!(
                "{} rows, {} areas",
                engine.dataset().len(),
                engine.geo_ordering().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vaccination dataset")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.report(|s| s.open_dataset(&path));
    }
}

pub fn open_geo_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open geographic area order")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.report(|s| s.open_geo_ordering(&path));
    }
}
