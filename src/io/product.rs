//! Level-2 product description handed to the file writer.
//!
//! Only the values the writer needs are assembled here: product type,
//! global attributes, grid mapping and time axis. Encoding them into
//! NetCDF/CF is left to the writer.

use crate::core::resample::TargetGrid;
use crate::types::{TsaError, TsaResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const L2_FORMAT_VERSION: &str = "0.0.1";
pub const L2_TIME_UNIT: &str = "days since 2000-01-01 00:00:00 UTC";
pub const CF_CONVENTIONS: &str = "CF-1.8, ACDD-1.3";
pub const STANDARD_NAME_VOCABULARY: &str = "CF Standard Name Table (Version 83, 17 October 2023)";

/// Layout of a Level-2 product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Swath,
    Grid,
}

impl ProductType {
    pub const CHOICES: [&'static str; 2] = ["swath", "grid"];
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Swath => write!(f, "swath"),
            ProductType::Grid => write!(f, "grid"),
        }
    }
}

impl FromStr for ProductType {
    type Err = TsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swath" => Ok(ProductType::Swath),
            "grid" => Ok(ProductType::Grid),
            _ => Err(TsaError::Configuration(format!(
                "unsupported L2 product type '{}', expected one of {:?}",
                s,
                ProductType::CHOICES
            ))),
        }
    }
}

/// Nominal time of the product, optionally with coverage bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCoverage {
    pub time: DateTime<Utc>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeCoverage {
    pub fn instant(time: DateTime<Utc>) -> Self {
        Self {
            time,
            start: None,
            end: None,
        }
    }

    pub fn bounded(time: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> TsaResult<Self> {
        if start > end {
            return Err(TsaError::Configuration(format!(
                "time coverage start {} is after end {}",
                start, end
            )));
        }
        Ok(Self {
            time,
            start: Some(start),
            end: Some(end),
        })
    }
}

/// Latitude/longitude extent of the product (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeospatialBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Everything the writer needs to lay out a Level-2 file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub product_type: ProductType,
    pub grid: TargetGrid,
    pub format_version: String,
    pub time_unit: String,
    pub date_created: DateTime<Utc>,
    pub time_coverage: Option<TimeCoverage>,
    pub geospatial_bounds: Option<GeospatialBounds>,
}

impl ProductDescriptor {
    /// Describe a product of the given type.
    ///
    /// Only gridded products can be described; swath products are rejected
    /// as unsupported.
    pub fn new(
        product_type: ProductType,
        grid: Option<&TargetGrid>,
        format_version: &str,
        time_unit: &str,
    ) -> TsaResult<Self> {
        let grid = match (product_type, grid) {
            (ProductType::Swath, _) => {
                return Err(TsaError::Unsupported(
                    "the 'swath' L2 product type is not implemented".to_string(),
                ))
            }
            (ProductType::Grid, None) => {
                return Err(TsaError::Configuration(
                    "a target grid definition is required for the 'grid' product type".to_string(),
                ))
            }
            (ProductType::Grid, Some(grid)) => grid.clone(),
        };

        log::debug!(
            "L2 {} product on {} (format {})",
            product_type,
            grid.area_id,
            format_version
        );

        Ok(Self {
            product_type,
            grid,
            format_version: format_version.to_string(),
            time_unit: time_unit.to_string(),
            date_created: Utc::now(),
            time_coverage: None,
            geospatial_bounds: None,
        })
    }

    pub fn with_time(mut self, coverage: TimeCoverage) -> Self {
        self.time_coverage = Some(coverage);
        self
    }

    pub fn with_geospatial_bounds(mut self, bounds: GeospatialBounds) -> Self {
        self.geospatial_bounds = Some(bounds);
        self
    }

    /// Nominal time expressed in the configured time unit, if it is the
    /// default "days since 2000-01-01" epoch
    pub fn time_value(&self) -> Option<f64> {
        let coverage = self.time_coverage.as_ref()?;
        if self.time_unit != L2_TIME_UNIT {
            return None;
        }
        days_since_epoch(coverage.time)
    }

    /// Global attributes in file order-independent form
    pub fn global_attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        let mut set = |k: &str, v: String| {
            attrs.insert(k.to_string(), v);
        };

        set("Conventions", CF_CONVENTIONS.to_string());
        set("date_created", format_utc(self.date_created));
        set("processing_level", "Level-2".to_string());
        set("product_level", "2".to_string());
        set("standard_name_vocabulary", STANDARD_NAME_VOCABULARY.to_string());
        set("spacecraft", "CIMR".to_string());
        set("instrument", "CIMR".to_string());
        set("format_version", self.format_version.clone());

        if let Some(epsg) = self.grid.epsg() {
            set("geospatial_bounds_crs", format!("EPSG:{}", epsg));
        }

        if let Some(bounds) = &self.geospatial_bounds {
            set("geospatial_lat_min", bounds.lat_min.to_string());
            set("geospatial_lat_max", bounds.lat_max.to_string());
            set("geospatial_lon_min", bounds.lon_min.to_string());
            set("geospatial_lon_max", bounds.lon_max.to_string());
        }

        if let Some(coverage) = &self.time_coverage {
            if let Some(start) = coverage.start {
                set("time_coverage_start", format_utc(start));
            }
            if let Some(end) = coverage.end {
                set("time_coverage_end", format_utc(end));
            }
        }

        attrs
    }
}

fn format_utc(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;

fn days_since_epoch(time: DateTime<Utc>) -> Option<f64> {
    let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single()?;
    Some(time.signed_duration_since(epoch).num_milliseconds() as f64 / MILLISECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resample::GridResolution;
    use chrono::Duration;

    fn grid() -> TargetGrid {
        TargetGrid::ease2_north(GridResolution::Km12_5)
    }

    #[test]
    fn test_product_type_parsing() {
        assert_eq!("Grid".parse::<ProductType>().unwrap(), ProductType::Grid);
        let err = "tile".parse::<ProductType>().unwrap_err();
        assert!(err.to_string().contains("swath") && err.to_string().contains("grid"));
    }

    #[test]
    fn test_swath_product_is_unsupported() {
        let result = ProductDescriptor::new(ProductType::Swath, None, L2_FORMAT_VERSION, L2_TIME_UNIT);
        assert!(matches!(result, Err(TsaError::Unsupported(_))));
    }

    #[test]
    fn test_grid_product_requires_grid() {
        let result = ProductDescriptor::new(ProductType::Grid, None, L2_FORMAT_VERSION, L2_TIME_UNIT);
        assert!(matches!(result, Err(TsaError::Configuration(_))));
    }

    #[test]
    fn test_global_attributes() {
        let time = Utc.with_ymd_and_hms(2028, 1, 10, 11, 48, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2028, 1, 10, 11, 48, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2028, 1, 10, 11, 57, 0).unwrap();

        let descriptor =
            ProductDescriptor::new(ProductType::Grid, Some(&grid()), L2_FORMAT_VERSION, L2_TIME_UNIT)
                .unwrap()
                .with_time(TimeCoverage::bounded(time, start, end).unwrap());

        let attrs = descriptor.global_attributes();
        assert_eq!(attrs["geospatial_bounds_crs"], "EPSG:6931");
        assert_eq!(attrs["format_version"], "0.0.1");
        assert_eq!(attrs["time_coverage_start"], "2028-01-10T11:48:00Z");
        assert_eq!(attrs["time_coverage_end"], "2028-01-10T11:57:00Z");
        assert!(attrs["date_created"].ends_with('Z'));
        assert!(!attrs.contains_key("geospatial_lat_min"));
    }

    #[test]
    fn test_time_value_in_days() {
        let time = Utc.with_ymd_and_hms(2000, 1, 11, 12, 0, 0).unwrap();
        let descriptor =
            ProductDescriptor::new(ProductType::Grid, Some(&grid()), L2_FORMAT_VERSION, L2_TIME_UNIT)
                .unwrap()
                .with_time(TimeCoverage::instant(time));
        assert_eq!(descriptor.time_value(), Some(10.5));
    }

    #[test]
    fn test_time_value_keeps_sub_second_precision() {
        let time = Utc.with_ymd_and_hms(2000, 1, 2, 0, 0, 0).unwrap() + Duration::milliseconds(43_200_500);
        let descriptor =
            ProductDescriptor::new(ProductType::Grid, Some(&grid()), L2_FORMAT_VERSION, L2_TIME_UNIT)
                .unwrap()
                .with_time(TimeCoverage::instant(time));
        let expected = 1.5 + 500.0 / MILLISECONDS_PER_DAY;
        assert!((descriptor.time_value().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_coverage_is_rejected() {
        let a = Utc.with_ymd_and_hms(2028, 1, 10, 12, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2028, 1, 10, 11, 0, 0).unwrap();
        assert!(TimeCoverage::bounded(a, a, b).is_err());
    }
}
