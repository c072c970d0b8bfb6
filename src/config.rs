use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::GeoScope;
use crate::data::model::SocDemFactor;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VACCINE_EXPLORER_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "vaccine-explorer.json";

/// Where the data lives and how the dashboard starts up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Primary dataset (`.csv` or `.parquet`).
    pub data_path: PathBuf,
    /// One-column CSV with the canonical area order.
    pub geo_order_path: PathBuf,
    /// Image shown by the "View Map of HHS Regions" button.
    pub hhs_region_map: Option<PathBuf>,
    pub geo_scope: GeoScope,
    pub default_vaccine: Option<String>,
    pub default_geographic_area: Option<String>,
    pub default_sociodemographic_factor: Option<SocDemFactor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/child_vaccination_data_cleaned.csv"),
            geo_order_path: PathBuf::from("data/geo_areas_order.csv"),
            hhs_region_map: Some(PathBuf::from("data/hhs-regions.png")),
            geo_scope: GeoScope::Sociodemographic,
            default_vaccine: None,
            default_geographic_area: None,
            default_sociodemographic_factor: Some(SocDemFactor::RaceEthnicity),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// `$VACCINE_EXPLORER_CONFIG`, else `./vaccine-explorer.json` if it
    /// exists, else the defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "data_path": "other.parquet", "geo_scope": "all",
                 "default_sociodemographic_factor": "Poverty Level" }}"#
        )
        .unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("other.parquet"));
        assert_eq!(cfg.geo_scope, GeoScope::All);
        assert_eq!(cfg.default_sociodemographic_factor, Some(SocDemFactor::PovertyLevel));
        assert_eq!(cfg.geo_order_path, AppConfig::default().geo_order_path);
    }

    #[test]
    fn default_area_list_drops_regions_and_territories() {
        assert_eq!(AppConfig::default().geo_scope, GeoScope::Sociodemographic);

        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap().geo_scope, GeoScope::Sociodemographic);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
        assert!(AppConfig::from_file(&dir.path().join("absent.json")).is_err());
    }
}
