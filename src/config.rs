use crate::error::InventoryError;
use rusoto_core::Region;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_REGIONS: [&str; 2] = ["us-east-1", "us-east-2"];
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp";

const REGIONS_VAR: &str = "RDS_INSIGHTS_REGIONS";
const OUTPUT_DIR_VAR: &str = "RDS_INSIGHTS_OUTPUT_DIR";

/// Regions to inventory, in the order their rows are written, and the
/// directory the report lands in.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub regions: Vec<Region>,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS
                .iter()
                .filter_map(|name| Region::from_str(name).ok())
                .collect(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ExportConfig {
    pub fn new(regions: Vec<Region>, output_dir: PathBuf) -> Result<Self, InventoryError> {
        if regions.is_empty() {
            return Err(InventoryError::Configuration(
                "region list is empty".to_string(),
            ));
        }
        Ok(ExportConfig {
            regions,
            output_dir,
        })
    }

    pub fn from_env() -> Result<Self, InventoryError> {
        Self::from_vars(
            std::env::var(REGIONS_VAR).ok(),
            std::env::var(OUTPUT_DIR_VAR).ok(),
        )
    }

    fn from_vars(
        regions: Option<String>,
        output_dir: Option<String>,
    ) -> Result<Self, InventoryError> {
        let defaults = Self::default();
        let regions = match regions {
            Some(value) => parse_regions(&value)?,
            None => defaults.regions,
        };
        let output_dir = output_dir
            .filter(|dir| !dir.trim().is_empty())
            .map_or(defaults.output_dir, PathBuf::from);
        Self::new(regions, output_dir)
    }
}

pub fn parse_regions(value: &str) -> Result<Vec<Region>, InventoryError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Region::from_str(name).map_err(|error| {
                InventoryError::Configuration(format!("unknown region {}: {}", name, error))
            })
        })
        .collect()
}
