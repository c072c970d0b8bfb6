use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{
    Column, Dataset, GeoOrdering, SocDemFactor, VaccinationRecord, MAP_BIRTH_YEAR, NATIONAL_AREA,
};

/// A filtered view of the dataset, in table order.
pub type Subset<'a> = Vec<&'a VaccinationRecord>;

// ---------------------------------------------------------------------------
// Selection – the user's current choices
// ---------------------------------------------------------------------------

/// Current value of every selector. `None` means "not chosen yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub vaccine: Option<String>,
    pub dose: Option<String>,
    pub age: Option<String>,
    pub geographic_area: Option<String>,
    pub sociodemographic_factor: Option<SocDemFactor>,
    pub sociodemographic_dose: Option<String>,
}

/// Which variant of the geographic option list to offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoScope {
    /// Every area of the ordering.
    All,
    /// HHS regions and territories removed; they never carry cohort rows.
    #[default]
    Sociodemographic,
}

// ---------------------------------------------------------------------------
// Distinct values
// ---------------------------------------------------------------------------

/// Unique non-empty values of `column` over `rows`.
///
/// Without `preferred` the result is in first-encountered order. With it,
/// values listed in `preferred` come first in that order, followed by any
/// other values in first-encountered order. Preferred values absent from
/// `rows` are not invented.
pub fn distinct_values<'a, I>(rows: I, column: Column, preferred: Option<&[&str]>) -> Vec<String>
where
    I: IntoIterator<Item = &'a VaccinationRecord>,
{
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut encountered: Vec<&'a str> = Vec::new();
    for row in rows {
        if let Some(value) = row.value(column) {
            if seen.insert(value) {
                encountered.push(value);
            }
        }
    }

    match preferred {
        None => encountered.into_iter().map(str::to_string).collect(),
        Some(order) => {
            let mut out: Vec<String> = order
                .iter()
                .filter(|v| seen.contains(**v))
                .map(|v| v.to_string())
                .collect();
            out.extend(
                encountered
                    .into_iter()
                    .filter(|v| !order.contains(v))
                    .map(str::to_string),
            );
            out
        }
    }
}

// ---------------------------------------------------------------------------
// FilterEngine
// ---------------------------------------------------------------------------

/// Cascading filter model over a shared, immutable dataset.
///
/// Every query re-scans the table. A query whose required selections are
/// unset returns an empty result instead of failing.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    dataset: Arc<Dataset>,
    geo: Arc<GeoOrdering>,
    selection: Selection,
}

impl FilterEngine {
    pub fn new(dataset: Arc<Dataset>, geo: Arc<GeoOrdering>) -> Self {
        FilterEngine {
            dataset,
            geo,
            selection: Selection::default(),
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn geo_ordering(&self) -> &Arc<GeoOrdering> {
        &self.geo
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn rows(&self) -> impl Iterator<Item = &VaccinationRecord> {
        self.dataset.records().iter()
    }

    // -- Option queries --

    /// Every vaccine in the table, first-encountered order.
    pub fn vaccine_options(&self) -> Vec<String> {
        distinct_values(self.rows(), Column::Vaccine, None)
    }

    /// Doses recorded for the selected vaccine.
    pub fn dose_options(&self) -> Vec<String> {
        let Some(vaccine) = self.selection.vaccine.as_deref() else {
            return Vec::new();
        };
        distinct_values(
            self.rows().filter(|r| r.vaccine == vaccine),
            Column::Dose,
            None,
        )
    }

    /// Age checkpoints for the selected vaccine and dose, taken only from
    /// birth-year rows.
    pub fn age_options(&self) -> Vec<String> {
        let (Some(vaccine), Some(dose)) = (
            self.selection.vaccine.as_deref(),
            self.selection.dose.as_deref(),
        ) else {
            return Vec::new();
        };
        distinct_values(
            self.rows()
                .filter(|r| r.vaccine == vaccine && r.dose == dose && r.birth_year.is_some()),
            Column::Age,
            None,
        )
    }

    /// Geographic areas in canonical display order.
    pub fn geo_options(&self, scope: GeoScope) -> Vec<&str> {
        match scope {
            GeoScope::All => self.geo.areas().iter().map(String::as_str).collect(),
            GeoScope::Sociodemographic => self.geo.without_regions_and_territories(),
        }
    }

    /// Doses with sociodemographic breakdowns for the selected vaccine, and
    /// the index the selector should default to: the main dose when it is
    /// available here, otherwise 0.
    pub fn soc_dem_dose_options(&self) -> (Vec<String>, usize) {
        let Some(vaccine) = self.selection.vaccine.as_deref() else {
            return (Vec::new(), 0);
        };
        let options = distinct_values(
            self.rows()
                .filter(|r| r.vaccine == vaccine && r.in_soc_dem_cohort()),
            Column::Dose,
            None,
        );
        let index = self
            .selection
            .dose
            .as_deref()
            .and_then(|dose| options.iter().position(|o| o == dose))
            .unwrap_or(0);
        (options, index)
    }

    // -- Subset queries --

    /// State rows for the choropleth, pinned to birth year 2020.
    pub fn filter_for_map(&self) -> Subset<'_> {
        let sel = &self.selection;
        let (Some(vaccine), Some(dose), Some(age)) =
            (sel.vaccine.as_deref(), sel.dose.as_deref(), sel.age.as_deref())
        else {
            return Vec::new();
        };
        self.rows()
            .filter(|r| {
                r.vaccine == vaccine
                    && r.dose == dose
                    && r.age.as_deref() == Some(age)
                    && r.birth_year.as_deref() == Some(MAP_BIRTH_YEAR)
                    && r.state.is_some()
            })
            .collect()
    }

    /// Birth-year rows for the selected area plus the national series.
    ///
    /// When the selected area is the nation itself each row still appears
    /// once, so the chart shows a single series.
    pub fn filter_for_line_graph(&self) -> Subset<'_> {
        let sel = &self.selection;
        let (Some(vaccine), Some(dose), Some(age)) =
            (sel.vaccine.as_deref(), sel.dose.as_deref(), sel.age.as_deref())
        else {
            return Vec::new();
        };
        let area = sel.geographic_area.as_deref();
        self.rows()
            .filter(|r| {
                r.vaccine == vaccine
                    && r.dose == dose
                    && r.age.as_deref() == Some(age)
                    && r.birth_year.is_some()
                    && (r.geographic_area == NATIONAL_AREA
                        || Some(r.geographic_area.as_str()) == area)
            })
            .collect()
    }

    /// Cohort rows for the selected area and sociodemographic dose where
    /// the chosen factor's column is populated.
    pub fn filter_for_bar_chart(&self) -> Subset<'_> {
        let sel = &self.selection;
        let (Some(vaccine), Some(dose), Some(area), Some(factor)) = (
            sel.vaccine.as_deref(),
            sel.sociodemographic_dose.as_deref(),
            sel.geographic_area.as_deref(),
            sel.sociodemographic_factor,
        ) else {
            return Vec::new();
        };
        let column = factor.column();
        self.rows()
            .filter(|r| {
                r.vaccine == vaccine
                    && r.in_soc_dem_cohort()
                    && r.dose == dose
                    && r.geographic_area == area
            })
            .filter(|r| r.value(column).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::BIRTH_COHORTS;

    fn year_row(vaccine: &str, dose: &str, age: &str, year: &str, area: &str, state: Option<&str>) -> VaccinationRecord {
        VaccinationRecord {
            vaccine: vaccine.into(),
            dose: dose.into(),
            age: Some(age.into()),
            birth_year: Some(year.into()),
            birth_cohort: None,
            geographic_area: area.into(),
            state: state.map(Into::into),
            race_ethnicity: None,
            poverty_level: None,
            health_insurance: None,
            urbanicity: None,
            estimate_pct: Some(90.0),
            sample_size: Some(100),
        }
    }

    fn cohort_row(vaccine: &str, dose: &str, cohort: &str, area: &str, factor: SocDemFactor, category: &str) -> VaccinationRecord {
        let mut row = VaccinationRecord {
            vaccine: vaccine.into(),
            dose: dose.into(),
            age: Some("35 Months".into()),
            birth_year: None,
            birth_cohort: Some(cohort.into()),
            geographic_area: area.into(),
            state: None,
            race_ethnicity: None,
            poverty_level: None,
            health_insurance: None,
            urbanicity: None,
            estimate_pct: Some(80.0),
            sample_size: None,
        };
        let value = Some(category.to_string());
        match factor {
            SocDemFactor::RaceEthnicity => row.race_ethnicity = value,
            SocDemFactor::PovertyLevel => row.poverty_level = value,
            SocDemFactor::HealthInsurance => row.health_insurance = value,
            SocDemFactor::Urbanicity => row.urbanicity = value,
        }
        row
    }

    fn fixture() -> FilterEngine {
        let mut rows = Vec::new();
        for year in 2011..=2020 {
            let y = year.to_string();
            rows.push(year_row("MMR", "≥1 Dose", "24 Months", &y, "United States", None));
            rows.push(year_row("MMR", "≥1 Dose", "24 Months", &y, "Texas", Some("TX")));
            rows.push(year_row("MMR", "≥1 Dose", "13 Months", &y, "United States", None));
        }
        rows.push(year_row("MMR", "≥1 Dose", "24 Months", "2020", "HHS Region 6", None));
        rows.push(year_row("MMR", "≥1 Dose", "24 Months", "2020", "Alabama", Some("AL")));
        rows.push(year_row("DTaP", "≥3 Doses", "24 Months", "2020", "Texas", Some("TX")));
        rows.push(year_row("DTaP", "≥4 Doses", "24 Months", "2020", "Texas", Some("TX")));
        for cohort in BIRTH_COHORTS {
            rows.push(cohort_row("MMR", "≥1 Dose", cohort, "Texas", SocDemFactor::RaceEthnicity, "Hispanic"));
            rows.push(cohort_row("MMR", "≥1 Dose", cohort, "Texas", SocDemFactor::RaceEthnicity, "Black, Non-Hispanic"));
            rows.push(cohort_row("MMR", "≥1 Dose", cohort, "Texas", SocDemFactor::Urbanicity, "Living In a Non-MSA"));
            rows.push(cohort_row("DTaP", "≥4 Doses", cohort, "Texas", SocDemFactor::PovertyLevel, "<133% FPL"));
        }
        // cohort outside the sociodemographic pair never counts
        rows.push(cohort_row("DTaP", "≥3 Doses", "2011-2014", "Texas", SocDemFactor::PovertyLevel, "<133% FPL"));
        // two doses with sociodemographic rows
        rows.push(cohort_row("Hep B", "≥1 Dose", "2016-2019", "Texas", SocDemFactor::HealthInsurance, "Uninsured"));
        rows.push(cohort_row("Hep B", "≥3 Doses", "2016-2019", "Texas", SocDemFactor::HealthInsurance, "Uninsured"));

        let geo = GeoOrdering::from_areas(["United States", "HHS Region 6", "Alabama", "Guam", "Texas"]);
        FilterEngine::new(Arc::new(Dataset::from_records(rows)), Arc::new(geo))
    }

    fn select(engine: &mut FilterEngine, vaccine: &str, dose: &str, age: &str, area: &str) {
        let sel = engine.selection_mut();
        sel.vaccine = Some(vaccine.into());
        sel.dose = Some(dose.into());
        sel.age = Some(age.into());
        sel.geographic_area = Some(area.into());
    }

    #[test]
    fn distinct_values_keep_first_encountered_order() {
        let engine = fixture();
        assert_eq!(engine.vaccine_options(), vec!["MMR", "DTaP", "Hep B"]);
    }

    #[test]
    fn distinct_values_honor_preferred_order() {
        let engine = fixture();
        let order = SocDemFactor::RaceEthnicity.category_order();
        let values = distinct_values(engine.dataset().records(), Column::RaceEthnicity, Some(order));
        assert_eq!(values, vec!["Black, Non-Hispanic", "Hispanic"]);

        let extra = distinct_values(engine.dataset().records(), Column::Urbanicity, Some(&["Living In a MSA Principal City"]));
        assert_eq!(extra, vec!["Living In a Non-MSA"]);
    }

    #[test]
    fn empty_selection_yields_empty_results() {
        let engine = fixture();
        assert!(engine.dose_options().is_empty());
        assert!(engine.age_options().is_empty());
        assert_eq!(engine.soc_dem_dose_options(), (Vec::new(), 0));
        assert!(engine.filter_for_map().is_empty());
        assert!(engine.filter_for_line_graph().is_empty());
        assert!(engine.filter_for_bar_chart().is_empty());
    }

    #[test]
    fn dose_options_follow_vaccine() {
        let mut engine = fixture();
        engine.selection_mut().vaccine = Some("DTaP".into());
        assert_eq!(engine.dose_options(), vec!["≥3 Doses", "≥4 Doses"]);
    }

    #[test]
    fn age_options_only_come_from_birth_year_rows() {
        let mut engine = fixture();
        engine.selection_mut().vaccine = Some("MMR".into());
        engine.selection_mut().dose = Some("≥1 Dose".into());
        let ages = engine.age_options();
        assert_eq!(ages, vec!["24 Months", "13 Months"]);
        // cohort rows carry "35 Months" in the fixture
        assert!(!ages.contains(&"35 Months".to_string()));
    }

    #[test]
    fn geo_options_respect_scope() {
        let engine = fixture();
        assert_eq!(
            engine.geo_options(GeoScope::All),
            vec!["United States", "HHS Region 6", "Alabama", "Guam", "Texas"]
        );
        assert_eq!(
            engine.geo_options(GeoScope::Sociodemographic),
            vec!["United States", "Alabama", "Texas"]
        );
    }

    #[test]
    fn soc_dem_doses_are_subset_of_doses() {
        let mut engine = fixture();
        for vaccine in engine.vaccine_options() {
            engine.selection_mut().vaccine = Some(vaccine);
            let doses = engine.dose_options();
            let (soc_dem, _) = engine.soc_dem_dose_options();
            assert!(soc_dem.iter().all(|d| doses.contains(d)));
        }
    }

    #[test]
    fn soc_dem_dose_defaults_to_main_dose_or_first() {
        let mut engine = fixture();
        engine.selection_mut().vaccine = Some("DTaP".into());
        engine.selection_mut().dose = Some("≥3 Doses".into());
        assert_eq!(engine.soc_dem_dose_options(), (vec!["≥4 Doses".to_string()], 0));

        engine.selection_mut().dose = Some("≥4 Doses".into());
        assert_eq!(engine.soc_dem_dose_options(), (vec!["≥4 Doses".to_string()], 0));

        engine.selection_mut().vaccine = Some("MMR".into());
        engine.selection_mut().dose = Some("≥1 Dose".into());
        assert_eq!(engine.soc_dem_dose_options(), (vec!["≥1 Dose".to_string()], 0));
    }

    #[test]
    fn soc_dem_dose_default_points_at_the_main_dose() {
        let mut engine = fixture();
        let both = vec!["≥1 Dose".to_string(), "≥3 Doses".to_string()];
        engine.selection_mut().vaccine = Some("Hep B".into());
        assert_eq!(engine.soc_dem_dose_options(), (both.clone(), 0));

        engine.selection_mut().dose = Some("≥3 Doses".into());
        assert_eq!(engine.soc_dem_dose_options(), (both.clone(), 1));

        engine.selection_mut().dose = Some("≥1 Dose".into());
        assert_eq!(engine.soc_dem_dose_options(), (both, 0));
    }

    #[test]
    fn map_is_pinned_to_2020_states() {
        let mut engine = fixture();
        select(&mut engine, "MMR", "≥1 Dose", "24 Months", "United States");
        let rows = engine.filter_for_map();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.birth_year.as_deref() == Some("2020")));
        assert!(rows.iter().all(|r| r.state.is_some()));
    }

    #[test]
    fn line_graph_for_the_nation_is_a_single_series() {
        let mut engine = fixture();
        select(&mut engine, "MMR", "≥1 Dose", "24 Months", "United States");
        let rows = engine.filter_for_line_graph();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.geographic_area == "United States"));
        let years = distinct_values(rows.iter().copied(), Column::BirthYear, None);
        let expected: Vec<String> = (2011..=2020).map(|y| y.to_string()).collect();
        assert_eq!(years, expected);
    }

    #[test]
    fn line_graph_always_includes_the_nation() {
        let mut engine = fixture();
        select(&mut engine, "MMR", "≥1 Dose", "24 Months", "Texas");
        let rows = engine.filter_for_line_graph();
        assert_eq!(rows.len(), 20);
        assert_eq!(
            distinct_values(rows.iter().copied(), Column::GeographicArea, None),
            vec!["United States", "Texas"]
        );

        // no local data: still the national series
        engine.selection_mut().geographic_area = Some("Guam".into());
        let rows = engine.filter_for_line_graph();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.geographic_area == "United States"));
    }

    #[test]
    fn bar_chart_keeps_cohort_rows_with_the_factor_column() {
        let mut engine = fixture();
        select(&mut engine, "MMR", "≥1 Dose", "24 Months", "Texas");
        engine.selection_mut().sociodemographic_dose = Some("≥1 Dose".into());
        engine.selection_mut().sociodemographic_factor = Some(SocDemFactor::RaceEthnicity);

        let rows = engine.filter_for_bar_chart();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.in_soc_dem_cohort()));
        assert!(rows.iter().all(|r| r.race_ethnicity.is_some()));
    }

    #[test]
    fn bar_chart_without_matching_factor_is_empty() {
        let mut engine = fixture();
        select(&mut engine, "MMR", "≥1 Dose", "24 Months", "Texas");
        engine.selection_mut().sociodemographic_dose = Some("≥1 Dose".into());
        engine.selection_mut().sociodemographic_factor = Some(SocDemFactor::PovertyLevel);
        assert!(engine.filter_for_bar_chart().is_empty());

        engine.selection_mut().sociodemographic_factor = Some(SocDemFactor::RaceEthnicity);
        engine.selection_mut().geographic_area = Some("Alabama".into());
        assert!(engine.filter_for_bar_chart().is_empty());
    }

    #[test]
    fn bar_chart_ignores_cohorts_outside_the_pair() {
        let mut engine = fixture();
        select(&mut engine, "DTaP", "≥3 Doses", "24 Months", "Texas");
        engine.selection_mut().sociodemographic_dose = Some("≥3 Doses".into());
        engine.selection_mut().sociodemographic_factor = Some(SocDemFactor::PovertyLevel);
        assert!(engine.filter_for_bar_chart().is_empty());
    }
}
