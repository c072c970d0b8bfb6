use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// The national series, always plotted next to the selected area.
pub const NATIONAL_AREA: &str = "United States";

/// The choropleth only shows the most recent completed birth year.
pub const MAP_BIRTH_YEAR: &str = "2020";

/// Four-year birth cohorts that carry sociodemographic breakdowns.
pub const BIRTH_COHORTS: [&str; 2] = ["2014-2017", "2016-2019"];

/// Age checkpoint at which every cohort row is measured.
pub const COHORT_AGE: &str = "24 Months";

/// Areas that never carry sociodemographic rows (besides HHS regions).
pub const TERRITORIES: [&str; 2] = ["Guam", "Puerto Rico"];

const HHS_REGION_MARKER: &str = "HHS Region";

/// Header of the numeric estimate column.
pub const ESTIMATE_HEADER: &str = "Estimate (%)";
/// Header of the numeric sample-size column.
pub const SAMPLE_SIZE_HEADER: &str = "Sample Size";

// ---------------------------------------------------------------------------
// Column – the categorical columns of the dataset
// ---------------------------------------------------------------------------

/// A categorical column of the primary dataset.
///
/// The header strings are a contract with the source files and must match
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Vaccine,
    Dose,
    Age,
    BirthYear,
    BirthCohort,
    GeographicArea,
    State,
    RaceEthnicity,
    PovertyLevel,
    HealthInsurance,
    Urbanicity,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Vaccine,
        Column::Dose,
        Column::Age,
        Column::BirthYear,
        Column::BirthCohort,
        Column::GeographicArea,
        Column::State,
        Column::RaceEthnicity,
        Column::PovertyLevel,
        Column::HealthInsurance,
        Column::Urbanicity,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Vaccine => "Vaccine",
            Column::Dose => "Dose",
            Column::Age => "Age",
            Column::BirthYear => "Birth Year",
            Column::BirthCohort => "Birth Cohort",
            Column::GeographicArea => "Geographic Area",
            Column::State => "State",
            Column::RaceEthnicity => "Race and Ethnicity",
            Column::PovertyLevel => "Poverty Level",
            Column::HealthInsurance => "Health Insurance Coverage",
            Column::Urbanicity => "Urbanicity",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Every header the primary dataset must carry, in file order.
pub fn required_headers() -> Vec<&'static str> {
    let mut headers: Vec<&'static str> = Column::ALL.iter().map(|c| c.header()).collect();
    headers.push(ESTIMATE_HEADER);
    headers.push(SAMPLE_SIZE_HEADER);
    headers
}

// ---------------------------------------------------------------------------
// Sociodemographic factors – static lookup table
// ---------------------------------------------------------------------------

/// A sociodemographic dimension the bar chart can break estimates down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocDemFactor {
    #[serde(rename = "Race and Ethnicity")]
    RaceEthnicity,
    #[serde(rename = "Poverty Level")]
    PovertyLevel,
    #[serde(rename = "Health Insurance Coverage")]
    HealthInsurance,
    #[serde(rename = "Urbanicity")]
    Urbanicity,
}

/// One entry of the factor lookup table.
#[derive(Debug)]
pub struct FactorEntry {
    pub factor: SocDemFactor,
    pub label: &'static str,
    pub column: Column,
    /// Category axis order the bar chart must honor.
    pub categories: &'static [&'static str],
}

pub static SOC_DEM_FACTORS: [FactorEntry; 4] = [
    FactorEntry {
        factor: SocDemFactor::RaceEthnicity,
        label: "Race and Ethnicity",
        column: Column::RaceEthnicity,
        categories: &[
            "Black, Non-Hispanic",
            "Hispanic",
            "White, Non-Hispanic",
            "Other or Multiple Races, Non-Hispanic",
        ],
    },
    FactorEntry {
        factor: SocDemFactor::PovertyLevel,
        label: "Poverty Level",
        column: Column::PovertyLevel,
        categories: &["<133% FPL", "133% to <400% FPL", ">400% FPL"],
    },
    FactorEntry {
        factor: SocDemFactor::HealthInsurance,
        label: "Health Insurance Coverage",
        column: Column::HealthInsurance,
        categories: &["Uninsured", "Any Medicaid", "Private Insurance Only", "Other"],
    },
    FactorEntry {
        factor: SocDemFactor::Urbanicity,
        label: "Urbanicity",
        column: Column::Urbanicity,
        categories: &[
            "Living In a MSA Principal City",
            "Living In a MSA Non-Principal City",
            "Living In a Non-MSA",
        ],
    },
];

impl SocDemFactor {
    pub const ALL: [SocDemFactor; 4] = [
        SocDemFactor::RaceEthnicity,
        SocDemFactor::PovertyLevel,
        SocDemFactor::HealthInsurance,
        SocDemFactor::Urbanicity,
    ];

    /// The table is laid out in declaration order of the variants.
    pub fn entry(self) -> &'static FactorEntry {
        &SOC_DEM_FACTORS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    pub fn column(self) -> Column {
        self.entry().column
    }

    pub fn category_order(self) -> &'static [&'static str] {
        self.entry().categories
    }
}

impl fmt::Display for SocDemFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SocDemFactor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SOC_DEM_FACTORS
            .iter()
            .find(|entry| entry.label == s)
            .map(|entry| entry.factor)
            .ok_or_else(|| format!("unknown sociodemographic factor '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// VaccinationRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// One coverage estimate, already normalized by the loader.
///
/// `birth_year` and `birth_cohort` are never both set. Sociodemographic
/// fields are only populated on cohort rows.
#[derive(Debug, Clone, PartialEq)]
pub struct VaccinationRecord {
    pub vaccine: String,
    pub dose: String,
    pub age: Option<String>,
    /// Discrete year label such as `"2020"`, never a float rendering.
    pub birth_year: Option<String>,
    pub birth_cohort: Option<String>,
    pub geographic_area: String,
    pub state: Option<String>,
    pub race_ethnicity: Option<String>,
    pub poverty_level: Option<String>,
    pub health_insurance: Option<String>,
    pub urbanicity: Option<String>,
    pub estimate_pct: Option<f64>,
    pub sample_size: Option<u64>,
}

impl VaccinationRecord {
    /// Text value of a categorical column, `None` when the cell is empty.
    pub fn value(&self, column: Column) -> Option<&str> {
        match column {
            Column::Vaccine => Some(self.vaccine.as_str()),
            Column::Dose => Some(self.dose.as_str()),
            Column::Age => self.age.as_deref(),
            Column::BirthYear => self.birth_year.as_deref(),
            Column::BirthCohort => self.birth_cohort.as_deref(),
            Column::GeographicArea => Some(self.geographic_area.as_str()),
            Column::State => self.state.as_deref(),
            Column::RaceEthnicity => self.race_ethnicity.as_deref(),
            Column::PovertyLevel => self.poverty_level.as_deref(),
            Column::HealthInsurance => self.health_insurance.as_deref(),
            Column::Urbanicity => self.urbanicity.as_deref(),
        }
    }

    /// Whether the row belongs to one of the sociodemographic cohorts.
    pub fn in_soc_dem_cohort(&self) -> bool {
        self.birth_cohort
            .as_deref()
            .is_some_and(|c| BIRTH_COHORTS.contains(&c))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Never mutated after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<VaccinationRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<VaccinationRecord>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[VaccinationRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GeoOrdering – canonical display order of geographic areas
// ---------------------------------------------------------------------------

/// Geographic areas in display order: the country, then HHS regions by
/// number, then states alphabetically with their city/county breakouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoOrdering {
    areas: Vec<String>,
}

impl GeoOrdering {
    /// Build from raw entries, keeping the first occurrence of duplicates.
    pub fn from_areas<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let areas = areas
            .into_iter()
            .map(Into::into)
            .filter(|a| seen.insert(a.clone()))
            .collect();
        GeoOrdering { areas }
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Areas that can carry sociodemographic data: HHS regions and
    /// territories removed.
    pub fn without_regions_and_territories(&self) -> Vec<&str> {
        self.areas
            .iter()
            .map(String::as_str)
            .filter(|a| is_soc_dem_area(a))
            .collect()
    }
}

/// False for HHS regions and territories.
pub fn is_soc_dem_area(area: &str) -> bool {
    !area.contains(HHS_REGION_MARKER) && !TERRITORIES.contains(&area)
}
