pub mod map;
pub mod panels;
pub mod plot;

use crate::data::filter::Selection;
use crate::data::model::{COHORT_AGE, MAP_BIRTH_YEAR};

/// Two-line heading shown above a chart.
pub type ChartTitle = (String, String);

pub fn map_title(sel: &Selection) -> Option<ChartTitle> {
    let (vaccine, dose, age) = (sel.vaccine.as_deref()?, sel.dose.as_deref()?, sel.age.as_deref()?);
    Some((
        format!("{vaccine} Vaccination Rates by State"),
        format!("{dose} by Age {age} for Children Born in {MAP_BIRTH_YEAR}"),
    ))
}

pub fn line_title(sel: &Selection) -> Option<ChartTitle> {
    let (vaccine, dose, age) = (sel.vaccine.as_deref()?, sel.dose.as_deref()?, sel.age.as_deref()?);
    let area = sel.geographic_area.as_deref()?;
    Some((
        format!("{vaccine} Vaccination Rates by Birth Year"),
        format!("{dose} by Age {age} in {area}"),
    ))
}

pub fn bar_title(sel: &Selection) -> Option<ChartTitle> {
    let vaccine = sel.vaccine.as_deref()?;
    let factor = sel.sociodemographic_factor?;
    let dose = sel.sociodemographic_dose.as_deref()?;
    let area = sel.geographic_area.as_deref()?;
    Some((
        format!("{vaccine} Vaccination Rates by {factor}"),
        format!("{dose} by Age {COHORT_AGE} for Two Birth Cohorts in {area}"),
    ))
}
