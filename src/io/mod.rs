//! Configuration input and product description output

pub mod config;
pub mod product;

pub use config::{ResolvedConfig, TsaConfig};
pub use product::{GeospatialBounds, ProductDescriptor, ProductType, TimeCoverage};
