use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::data::filter::FilterEngine;
use crate::data::loader::{load_dataset, load_geo_ordering};
use crate::data::model::{Dataset, GeoOrdering, SocDemFactor};
use crate::data::series::{self, BarChartData, LineChartData, MapCell};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Selector option lists and chart data are cached here and rebuilt only
/// when a selection changes.
pub struct AppState {
    pub config: AppConfig,

    /// Filter model over the loaded data (None until both files load).
    pub engine: Option<FilterEngine>,

    pub vaccine_options: Vec<String>,
    pub dose_options: Vec<String>,
    pub age_options: Vec<String>,
    pub geo_options: Vec<String>,
    pub soc_dem_dose_options: Vec<String>,

    pub map: Vec<MapCell>,
    pub line: LineChartData,
    pub bars: Option<BarChartData>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            engine: None,
            vaccine_options: Vec::new(),
            dose_options: Vec::new(),
            age_options: Vec::new(),
            geo_options: Vec::new(),
            soc_dem_dose_options: Vec::new(),
            map: Vec::new(),
            line: LineChartData::default(),
            bars: None,
            status_message: None,
        }
    }

    /// Load the files named in the config, reporting failure in the UI.
    pub fn load_configured(&mut self) {
        let data_path = self.config.data_path.clone();
        let geo_path = self.config.geo_order_path.clone();
        self.report(|state| state.load(&data_path, &geo_path));
    }

    /// Load both files and replace the current data.  On error the
    /// previous data and selection are left untouched.
    pub fn load(&mut self, data_path: &Path, geo_path: &Path) -> Result<()> {
        let dataset = load_dataset(data_path)
            .with_context(|| format!("loading dataset {}", data_path.display()))?;
        let geo = load_geo_ordering(geo_path)
            .with_context(|| format!("loading geographic order {}", geo_path.display()))?;
        self.set_data(Arc::new(dataset), Arc::new(geo));
        Ok(())
    }

    /// Swap in a new dataset, keeping the current geographic order.
    pub fn open_dataset(&mut self, path: &Path) -> Result<()> {
        let dataset =
            load_dataset(path).with_context(|| format!("loading dataset {}", path.display()))?;
        let geo = match &self.engine {
            Some(engine) => Arc::clone(engine.geo_ordering()),
            None => {
                let geo_path = self.config.geo_order_path.clone();
                let geo = load_geo_ordering(&geo_path).with_context(|| {
                    format!("loading geographic order {}", geo_path.display())
                })?;
                Arc::new(geo)
            }
        };
        self.set_data(Arc::new(dataset), geo);
        Ok(())
    }

    /// Swap in a new geographic order, keeping the current dataset.
    pub fn open_geo_ordering(&mut self, path: &Path) -> Result<()> {
        let geo = load_geo_ordering(path)
            .with_context(|| format!("loading geographic order {}", path.display()))?;
        match &self.engine {
            Some(engine) => {
                let dataset = Arc::clone(engine.dataset());
                self.set_data(dataset, Arc::new(geo));
            }
            None => self.config.geo_order_path = path.to_path_buf(),
        }
        Ok(())
    }

    /// Run a fallible action and surface its error as the status message.
    pub fn report(&mut self, action: impl FnOnce(&mut Self) -> Result<()>) {
        match action(self) {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest freshly loaded data, seed the selection from the config and
    /// previous choices, and rebuild every option list and chart.
    pub fn set_data(&mut self, dataset: Arc<Dataset>, geo: Arc<GeoOrdering>) {
        let previous = self.engine.as_ref().map(|e| e.selection().clone());
        let mut engine = FilterEngine::new(dataset, geo);

        self.vaccine_options = engine.vaccine_options();
        self.geo_options = engine
            .geo_options(self.config.geo_scope)
            .into_iter()
            .map(str::to_string)
            .collect();

        let sel = engine.selection_mut();
        let prev_vaccine = previous.as_ref().and_then(|p| p.vaccine.clone());
        let prev_area = previous.as_ref().and_then(|p| p.geographic_area.clone());
        sel.vaccine = keep_or_first(
            prev_vaccine.or_else(|| self.config.default_vaccine.clone()),
            &self.vaccine_options,
        );
        sel.geographic_area = keep_or_first(
            prev_area.or_else(|| self.config.default_geographic_area.clone()),
            &self.geo_options,
        );
        sel.sociodemographic_factor = previous
            .as_ref()
            .and_then(|p| p.sociodemographic_factor)
            .or(self.config.default_sociodemographic_factor)
            .or(Some(SocDemFactor::RaceEthnicity));
        if let Some(p) = previous {
            sel.dose = p.dose;
            sel.age = p.age;
        }

        self.engine = Some(engine);
        self.cascade_from_vaccine();
    }

    pub fn select_vaccine(&mut self, vaccine: String) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().vaccine = Some(vaccine);
            self.cascade_from_vaccine();
        }
    }

    pub fn select_dose(&mut self, dose: String) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().dose = Some(dose);
            self.cascade_from_dose();
        }
    }

    pub fn select_age(&mut self, age: String) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().age = Some(age);
            self.refresh_views();
        }
    }

    pub fn select_geographic_area(&mut self, area: String) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().geographic_area = Some(area);
            self.refresh_views();
        }
    }

    pub fn select_soc_dem_factor(&mut self, factor: SocDemFactor) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().sociodemographic_factor = Some(factor);
            self.refresh_views();
        }
    }

    pub fn select_soc_dem_dose(&mut self, dose: String) {
        if let Some(engine) = &mut self.engine {
            engine.selection_mut().sociodemographic_dose = Some(dose);
            self.refresh_views();
        }
    }

    fn cascade_from_vaccine(&mut self) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        self.dose_options = engine.dose_options();
        let current = engine.selection().dose.clone();
        engine.selection_mut().dose = keep_or_first(current, &self.dose_options);
        self.cascade_from_dose();
    }

    fn cascade_from_dose(&mut self) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        self.age_options = engine.age_options();
        let current = engine.selection().age.clone();
        engine.selection_mut().age = keep_or_first(current, &self.age_options);

        // The sociodemographic dose follows the main dose whenever the
        // vaccine or dose changes.
        let (options, default_index) = engine.soc_dem_dose_options();
        engine.selection_mut().sociodemographic_dose = options.get(default_index).cloned();
        self.soc_dem_dose_options = options;

        self.refresh_views();
    }

    /// Recompute the three chart subsets after a selection change.
    pub fn refresh_views(&mut self) {
        let Some(engine) = &self.engine else {
            return;
        };

        let map_rows = engine.filter_for_map();
        let line_rows = engine.filter_for_line_graph();
        let bar_rows = engine.filter_for_bar_chart();
        log::debug!(
            "Selection {:?}: map {} rows, line {} rows, bar {} rows",
            engine.selection(),
            map_rows.len(),
            line_rows.len(),
            bar_rows.len()
        );

        self.map = series::map_cells(&map_rows);
        self.line = series::line_chart(&line_rows);
        self.bars = engine
            .selection()
            .sociodemographic_factor
            .map(|factor| series::bar_chart(&bar_rows, factor));
    }
}

/// Keep `current` if it is still offered, otherwise fall back to the first
/// option (or nothing when there are no options).
fn keep_or_first(current: Option<String>, options: &[String]) -> Option<String> {
    match current {
        Some(value) if options.contains(&value) => Some(value),
        _ => options.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::VaccinationRecord;

    fn record(vaccine: &str, dose: &str, year: Option<&str>, cohort: Option<&str>, area: &str) -> VaccinationRecord {
        VaccinationRecord {
            vaccine: vaccine.into(),
            dose: dose.into(),
            age: Some("24 Months".into()),
            birth_year: year.map(Into::into),
            birth_cohort: cohort.map(Into::into),
            geographic_area: area.into(),
            state: (area == "Texas" && year.is_some()).then(|| "TX".to_string()),
            race_ethnicity: cohort.map(|_| "Hispanic".to_string()),
            poverty_level: None,
            health_insurance: None,
            urbanicity: None,
            estimate_pct: Some(75.0),
            sample_size: Some(10),
        }
    }

    fn loaded_state() -> AppState {
        let rows = vec![
            record("DTaP", "≥3 Doses", Some("2020"), None, "Texas"),
            record("DTaP", "≥4 Doses", Some("2020"), None, "Texas"),
            record("DTaP", "≥4 Doses", None, Some("2016-2019"), "Texas"),
            record("MMR", "≥1 Dose", Some("2020"), None, "United States"),
            record("MMR", "≥1 Dose", Some("2020"), None, "Texas"),
            record("Hep B", "≥1 Dose", Some("2020"), None, "Texas"),
            record("Hep B", "≥1 Dose", None, Some("2016-2019"), "Texas"),
            record("Hep B", "≥3 Doses", Some("2020"), None, "Texas"),
            record("Hep B", "≥3 Doses", None, Some("2016-2019"), "Texas"),
        ];
        let geo = GeoOrdering::from_areas(["United States", "HHS Region 6", "Guam", "Texas"]);
        let mut state = AppState::default();
        state.set_data(Arc::new(Dataset::from_records(rows)), Arc::new(geo));
        state
    }

    fn selection(state: &AppState) -> &crate::data::filter::Selection {
        state.engine.as_ref().unwrap().selection()
    }

    #[test]
    fn loading_selects_first_options() {
        let state = loaded_state();
        let sel = selection(&state);
        assert_eq!(sel.vaccine.as_deref(), Some("DTaP"));
        assert_eq!(sel.dose.as_deref(), Some("≥3 Doses"));
        assert_eq!(sel.age.as_deref(), Some("24 Months"));
        assert_eq!(sel.geographic_area.as_deref(), Some("United States"));
        assert_eq!(sel.sociodemographic_factor, Some(SocDemFactor::RaceEthnicity));
        // ≥3 Doses has no cohort rows: falls back to the first soc-dem dose
        assert_eq!(sel.sociodemographic_dose.as_deref(), Some("≥4 Doses"));
        assert_eq!(state.map.len(), 1);
    }

    #[test]
    fn changing_dose_resets_soc_dem_dose_to_mirror_it() {
        let mut state = loaded_state();
        state.select_dose("≥4 Doses".into());
        assert_eq!(selection(&state).sociodemographic_dose.as_deref(), Some("≥4 Doses"));

        state.select_geographic_area("Texas".into());
        let bars = state.bars.as_ref().unwrap();
        assert_eq!(bars.categories, vec!["Hispanic"]);
        assert_eq!(bars.groups.len(), 1);
    }

    #[test]
    fn soc_dem_dose_follows_a_later_main_dose() {
        let mut state = loaded_state();
        // ≥3 Doses carries over from DTaP and is the second soc-dem option
        state.select_vaccine("Hep B".into());
        assert_eq!(state.soc_dem_dose_options, vec!["≥1 Dose", "≥3 Doses"]);
        assert_eq!(selection(&state).dose.as_deref(), Some("≥3 Doses"));
        assert_eq!(selection(&state).sociodemographic_dose.as_deref(), Some("≥3 Doses"));

        state.select_dose("≥1 Dose".into());
        assert_eq!(selection(&state).sociodemographic_dose.as_deref(), Some("≥1 Dose"));

        // picking the soc-dem dose directly does not touch the main dose
        state.select_soc_dem_dose("≥3 Doses".into());
        assert_eq!(selection(&state).dose.as_deref(), Some("≥1 Dose"));
        assert_eq!(selection(&state).sociodemographic_dose.as_deref(), Some("≥3 Doses"));
    }

    #[test]
    fn default_area_list_hides_regions_and_territories() {
        let state = loaded_state();
        assert_eq!(state.geo_options, vec!["United States", "Texas"]);
    }

    #[test]
    fn opening_a_geo_order_shares_the_loaded_dataset() {
        let mut state = loaded_state();
        let before = Arc::clone(state.engine.as_ref().unwrap().dataset());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.csv");
        std::fs::write(&path, "geo_area\nTexas\nUnited States\n").unwrap();
        state.open_geo_ordering(&path).unwrap();

        let engine = state.engine.as_ref().unwrap();
        assert!(Arc::ptr_eq(&before, engine.dataset()));
        assert_eq!(state.geo_options, vec!["Texas", "United States"]);
    }

    #[test]
    fn changing_vaccine_repopulates_downstream_selectors() {
        let mut state = loaded_state();
        state.select_vaccine("MMR".into());
        assert_eq!(state.dose_options, vec!["≥1 Dose"]);
        assert_eq!(selection(&state).dose.as_deref(), Some("≥1 Dose"));
        assert!(state.soc_dem_dose_options.is_empty());
        assert_eq!(selection(&state).sociodemographic_dose, None);
        assert_eq!(state.line.series.len(), 1);
        assert!(state.bars.as_ref().unwrap().groups.is_empty());
    }

    #[test]
    fn failed_load_keeps_previous_data() {
        let mut state = loaded_state();
        state.select_vaccine("MMR".into());
        let before = selection(&state).clone();

        state.report(|s| s.load(Path::new("/nonexistent/data.csv"), Path::new("/nonexistent/geo.csv")));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
        assert_eq!(selection(&state), &before);
        assert_eq!(state.engine.as_ref().unwrap().dataset().len(), 9);
    }

    #[test]
    fn keep_or_first_falls_back() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(keep_or_first(Some("b".into()), &options).as_deref(), Some("b"));
        assert_eq!(keep_or_first(Some("z".into()), &options).as_deref(), Some("a"));
        assert_eq!(keep_or_first(None, &[]), None);
    }
}
