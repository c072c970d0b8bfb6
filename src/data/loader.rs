use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::error::{DataLoadError, Result};
use super::model::{required_headers, Dataset, GeoOrdering, VaccinationRecord};

/// Header of the single column in the geographic ordering file.
pub const GEO_AREA_HEADER: &str = "geo_area";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the vaccination dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the exact column names of the dataset
/// * `.parquet` – same columns; numeric columns may be int or float
///
/// Every row goes through [`normalize_record`] exactly once.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => read_csv_records(path)?,
        "parquet" | "pq" => read_parquet_records(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };

    let mut records = Vec::with_capacity(raw.len());
    let mut untagged = 0usize;
    for (i, rec) in raw.into_iter().enumerate() {
        let rec = normalize_record(rec, i + 1)?;
        if rec.birth_year.is_none() && rec.birth_cohort.is_none() {
            untagged += 1;
        }
        records.push(rec);
    }
    if untagged > 0 {
        log::warn!("{untagged} rows have neither a birth year nor a birth cohort");
    }

    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(Dataset::from_records(records))
}

/// Load the canonical geographic display order from a one-column CSV.
pub fn load_geo_ordering(path: &Path) -> Result<GeoOrdering> {
    #[derive(Deserialize)]
    struct GeoRow {
        geo_area: Option<String>,
    }

    let mut reader = open_csv(path)?;
    check_headers(&mut reader, path, &[GEO_AREA_HEADER])?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<GeoRow>() {
        let row = result.map_err(|source| csv_error(path, source))?;
        if let Some(area) = row.geo_area.filter(|a| !a.is_empty()) {
            entries.push(area);
        }
    }

    let total = entries.len();
    let ordering = GeoOrdering::from_areas(entries);
    if ordering.len() < total {
        log::warn!(
            "Collapsed {} duplicate geographic areas in {}",
            total - ordering.len(),
            path.display()
        );
    }
    log::info!("Loaded {} geographic areas from {}", ordering.len(), path.display());
    Ok(ordering)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// A row as it comes out of the source file, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Vaccine")]
    pub vaccine: Option<String>,
    #[serde(rename = "Dose")]
    pub dose: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<String>,
    #[serde(rename = "Birth Year")]
    pub birth_year: Option<String>,
    #[serde(rename = "Birth Cohort")]
    pub birth_cohort: Option<String>,
    #[serde(rename = "Geographic Area")]
    pub geographic_area: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Race and Ethnicity")]
    pub race_ethnicity: Option<String>,
    #[serde(rename = "Poverty Level")]
    pub poverty_level: Option<String>,
    #[serde(rename = "Health Insurance Coverage")]
    pub health_insurance: Option<String>,
    #[serde(rename = "Urbanicity")]
    pub urbanicity: Option<String>,
    #[serde(rename = "Estimate (%)")]
    pub estimate_pct: Option<f64>,
    #[serde(rename = "Sample Size")]
    pub sample_size: Option<f64>,
}

/// Turn a raw row into a [`VaccinationRecord`].
///
/// * `birth_year` becomes an integral label (`"2020.0"` → `"2020"`); absent
///   stays absent.
/// * `sample_size` becomes an integer; absent stays absent, distinct from 0.
/// * empty text cells become `None`; an empty vaccine, dose or
///   geographic area is a [`DataLoadError::InvalidRow`].
pub fn normalize_record(raw: RawRecord, row: usize) -> Result<VaccinationRecord> {
    let invalid = |reason: String| DataLoadError::InvalidRow { row, reason };
    let required = |value: Option<String>, header: &str| {
        non_empty(value).ok_or_else(|| invalid(format!("'{header}' is empty")))
    };

    let vaccine = required(raw.vaccine, "Vaccine")?;
    let dose = required(raw.dose, "Dose")?;
    let geographic_area = required(raw.geographic_area, "Geographic Area")?;

    let birth_year = match non_empty(raw.birth_year) {
        Some(text) => Some(normalize_birth_year(&text).map_err(invalid)?),
        None => None,
    };
    let birth_cohort = non_empty(raw.birth_cohort);
    if birth_year.is_some() && birth_cohort.is_some() {
        return Err(invalid("row has both a birth year and a birth cohort".into()));
    }

    let estimate_pct = match raw.estimate_pct.filter(|v| !v.is_nan()) {
        Some(v) if !(0.0..=100.0).contains(&v) => {
            return Err(invalid(format!("estimate {v} is outside 0-100")));
        }
        other => other,
    };

    let sample_size = match raw.sample_size.filter(|v| !v.is_nan()) {
        Some(v) => Some(coerce_sample_size(v).map_err(invalid)?),
        None => None,
    };

    Ok(VaccinationRecord {
        vaccine,
        dose,
        age: non_empty(raw.age),
        birth_year,
        birth_cohort,
        geographic_area,
        state: non_empty(raw.state),
        race_ethnicity: non_empty(raw.race_ethnicity),
        poverty_level: non_empty(raw.poverty_level),
        health_insurance: non_empty(raw.health_insurance),
        urbanicity: non_empty(raw.urbanicity),
        estimate_pct,
        sample_size,
    })
}

/// Render a birth year as a discrete label, never as a float.
pub fn normalize_birth_year(text: &str) -> std::result::Result<String, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("birth year '{text}' is not a number"))?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(format!("birth year '{text}' is not a whole year"));
    }
    Ok(format!("{}", value as i64))
}

fn coerce_sample_size(value: f64) -> std::result::Result<u64, String> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(format!("sample size {value} is not a non-negative integer"));
    }
    Ok(value as u64)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, source: csv::Error) -> DataLoadError {
    DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn check_headers(reader: &mut csv::Reader<File>, path: &Path, required: &[&str]) -> Result<()> {
    let headers = reader.headers().map_err(|source| csv_error(path, source))?;
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !headers.iter().any(|h| h == **name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataLoadError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        })
    }
}

fn read_csv_records(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = open_csv(path)?;
    check_headers(&mut reader, path, &required_headers())?;

    reader
        .deserialize::<RawRecord>()
        .map(|result| result.map_err(|source| csv_error(path, source)))
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read a Parquet file written by pandas (`df.to_parquet()`) or polars.
///
/// Text columns may be Utf8 or LargeUtf8. Numeric columns may be any of
/// Int32, Int64, Float32, Float64; nulls and NaN both mean "missing".
fn read_parquet_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    // A file without rows yields no batches, so check the file schema.
    let schema = builder.schema();
    let missing: Vec<String> = required_headers()
        .into_iter()
        .filter(|h| schema.index_of(h).is_err())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(DataLoadError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let reader = builder.build()?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let col = |name: &str| column(&batch, name);
        let vaccine = col("Vaccine")?;
        let dose = col("Dose")?;
        let age = col("Age")?;
        let birth_year = col("Birth Year")?;
        let birth_cohort = col("Birth Cohort")?;
        let geographic_area = col("Geographic Area")?;
        let state = col("State")?;
        let race_ethnicity = col("Race and Ethnicity")?;
        let poverty_level = col("Poverty Level")?;
        let health_insurance = col("Health Insurance Coverage")?;
        let urbanicity = col("Urbanicity")?;
        let estimate = col("Estimate (%)")?;
        let sample_size = col("Sample Size")?;

        for row in 0..batch.num_rows() {
            let line = records.len() + 1;
            records.push(RawRecord {
                vaccine: text_cell(vaccine, row, line)?,
                dose: text_cell(dose, row, line)?,
                age: text_cell(age, row, line)?,
                birth_year: text_cell(birth_year, row, line)?,
                birth_cohort: text_cell(birth_cohort, row, line)?,
                geographic_area: text_cell(geographic_area, row, line)?,
                state: text_cell(state, row, line)?,
                race_ethnicity: text_cell(race_ethnicity, row, line)?,
                poverty_level: text_cell(poverty_level, row, line)?,
                health_insurance: text_cell(health_insurance, row, line)?,
                urbanicity: text_cell(urbanicity, row, line)?,
                estimate_pct: number_cell(estimate, row, line)?,
                sample_size: number_cell(sample_size, row, line)?,
            });
        }
    }

    Ok(records)
}

// -- Arrow cell helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch.schema().index_of(name)?;
    Ok(batch.column(idx))
}

fn text_cell(col: &ArrayRef, row: usize, line: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => Ok(Some(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Ok(Some(col.as_string::<i64>().value(row).to_string())),
        DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64 => {
            Ok(number_cell(col, row, line)?.map(|v| v.to_string()))
        }
        other => Err(DataLoadError::InvalidRow {
            row: line,
            reason: format!("unsupported text column type {other:?}"),
        }),
    }
}

fn number_cell(col: &ArrayRef, row: usize, line: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        other => {
            return Err(DataLoadError::InvalidRow {
                row: line,
                reason: format!("unsupported numeric column type {other:?}"),
            });
        }
    };
    Ok((!value.is_nan()).then_some(value))
}
