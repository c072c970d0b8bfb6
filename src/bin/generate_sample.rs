//! Writes a synthetic dataset with the same layout as the real one:
//! `data/child_vaccination_data_cleaned.csv`, the same rows as `.parquet`,
//! and `data/geo_areas_order.csv`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const HEADERS: [&str; 13] = [
    "Vaccine",
    "Dose",
    "Age",
    "Birth Year",
    "Birth Cohort",
    "Geographic Area",
    "State",
    "Race and Ethnicity",
    "Poverty Level",
    "Health Insurance Coverage",
    "Urbanicity",
    "Estimate (%)",
    "Sample Size",
];

/// (vaccine, dose, base coverage, has sociodemographic rows)
const VACCINES: [(&str, &str, f64, bool); 6] = [
    ("DTaP", "≥3 Doses", 94.0, false),
    ("DTaP", "≥4 Doses", 81.0, true),
    ("MMR", "≥1 Dose", 91.0, true),
    ("Hep B", "≥3 Doses", 91.5, true),
    ("Rotavirus", "Complete Series", 74.0, false),
    ("Influenza", "≥2 Doses", 58.0, true),
];

const AGES: [&str; 4] = ["13 Months", "19 Months", "24 Months", "35 Months"];

/// (area, state code)
const AREAS: [(&str, Option<&str>); 12] = [
    ("United States", None),
    ("HHS Region 1", None),
    ("HHS Region 6", None),
    ("Alabama", Some("AL")),
    ("California", Some("CA")),
    ("Guam", None),
    ("New York", Some("NY")),
    ("NY-City of New York", None),
    ("NY-Rest of state", None),
    ("Puerto Rico", None),
    ("Texas", Some("TX")),
    ("TX-City of Houston", None),
];

const SOC_DEM: [(usize, &[&str]); 4] = [
    (7, &["Black, Non-Hispanic", "Hispanic", "White, Non-Hispanic", "Other or Multiple Races, Non-Hispanic"]),
    (8, &["<133% FPL", "133% to <400% FPL", ">400% FPL"]),
    (9, &["Uninsured", "Any Medicaid", "Private Insurance Only", "Other"]),
    (10, &["Living In a MSA Principal City", "Living In a MSA Non-Principal City", "Living In a Non-MSA"]),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn estimate(&mut self, mean: f64) -> f64 {
        (self.gauss(mean, 2.5).clamp(0.0, 100.0) * 10.0).round() / 10.0
    }

    fn sample_size(&mut self) -> f64 {
        (150 + self.next_u64() % 2500) as f64
    }
}

type Row = [Option<String>; 13];

fn cell(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();

    for &(vaccine, dose, base, soc_dem) in &VACCINES {
        // Birth-year rows: every age checkpoint, year and area.
        for (age_idx, age) in AGES.iter().enumerate() {
            let age_gain = age_idx as f64 * 2.0;
            for year in 2011..=2020 {
                let trend = (year - 2011) as f64 * 0.15;
                for &(area, state) in &AREAS {
                    let mut row: Row = Default::default();
                    row[0] = cell(vaccine);
                    row[1] = cell(dose);
                    row[2] = cell(age);
                    row[3] = Some(format!("{year}.0"));
                    row[5] = cell(area);
                    row[6] = state.map(str::to_string);
                    row[11] = Some(rng.estimate(base - 8.0 + age_gain + trend).to_string());
                    row[12] = Some(format!("{:.1}", rng.sample_size()));
                    rows.push(row);
                }
            }
        }

        if !soc_dem {
            continue;
        }

        // Cohort rows: one dimension per row, no HHS regions or territories.
        for cohort in ["2014-2017", "2016-2019"] {
            for &(area, _) in AREAS.iter().filter(|(a, _)| {
                !a.contains("HHS Region") && *a != "Guam" && *a != "Puerto Rico"
            }) {
                for &(column, categories) in &SOC_DEM {
                    for (i, category) in categories.iter().enumerate() {
                        let mut row: Row = Default::default();
                        row[0] = cell(vaccine);
                        row[1] = cell(dose);
                        row[2] = cell("24 Months");
                        row[4] = cell(cohort);
                        row[5] = cell(area);
                        row[column] = cell(category);
                        row[11] = Some(rng.estimate(base - 3.0 * i as f64).to_string());
                        row[12] = Some(format!("{:.1}", rng.sample_size()));
                        rows.push(row);
                    }
                }
            }
        }
    }

    rows
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating dataset CSV")?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let numeric = |idx: usize| idx == 3 || idx == 11 || idx == 12;

    let fields: Vec<Field> = HEADERS
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let ty = if numeric(idx) { DataType::Float64 } else { DataType::Utf8 };
            Field::new(*name, ty, true)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = (0..HEADERS.len())
        .map(|idx| -> ArrayRef {
            if numeric(idx) {
                Arc::new(Float64Array::from(
                    rows.iter()
                        .map(|r| r[idx].as_deref().and_then(|v| v.parse::<f64>().ok()))
                        .collect::<Vec<_>>(),
                ))
            } else {
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r[idx].as_deref()).collect::<Vec<_>>(),
                ))
            }
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_geo_order(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating geo order CSV")?;
    writer.write_record(["geo_area"])?;
    for (area, _) in AREAS {
        writer.write_record([area])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let out = Path::new("data");
    fs::create_dir_all(out).context("creating data directory")?;

    write_csv(&out.join("child_vaccination_data_cleaned.csv"), &rows)?;
    write_parquet(&out.join("child_vaccination_data_cleaned.parquet"), &rows)?;
    write_geo_order(&out.join("geo_areas_order.csv"))?;

    println!("Wrote {} rows and {} geographic areas to {}", rows.len(), AREAS.len(), out.display());
    Ok(())
}
