use std::io::Write;
use tempfile::NamedTempFile;
use tsa_snow::core::{DetectionAlgorithm, GridResolution, Matchup};
use tsa_snow::io::{ProductDescriptor, ProductType, TsaConfig};
use tsa_snow::TsaError;

#[test]
fn test_config_file_round_trip_to_product() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<tsaConfig>
    <algorithm>Pulliainen2010</algorithm>
    <gridResolution>6.25</gridResolution>
    <radiusOfInfluenceM>7500</radiusOfInfluenceM>
    <productType>grid</productType>
    <formatVersion>0.0.2</formatVersion>
    <parallel>false</parallel>
</tsaConfig>"#
    )
    .expect("Failed to write config");

    let config = TsaConfig::from_file(file.path()).unwrap();
    let resolved = config.validate().unwrap();
    assert_eq!(resolved.algorithm, DetectionAlgorithm::Pulliainen2010);
    assert_eq!(resolved.grid_resolution, GridResolution::Km6_25);
    assert_eq!(resolved.radius_of_influence_m, 7500.0);
    assert!(!resolved.parallel);

    let grid = tsa_snow::core::TargetGrid::ease2_north(resolved.grid_resolution);
    let descriptor = ProductDescriptor::new(
        resolved.product_type,
        Some(&grid),
        &resolved.format_version,
        &resolved.time_unit,
    )
    .unwrap();
    assert_eq!(descriptor.global_attributes()["format_version"], "0.0.2");
}

#[test]
fn test_unknown_selectors_name_valid_choices() {
    let config = TsaConfig {
        product_type: "tiles".to_string(),
        ..TsaConfig::default()
    };
    match config.validate() {
        Err(TsaError::Configuration(msg)) => {
            assert!(msg.contains("swath") && msg.contains("grid"), "{}", msg)
        }
        other => panic!("expected configuration error, got {:?}", other),
    }

    let config = TsaConfig {
        grid_resolution: "25".to_string(),
        ..TsaConfig::default()
    };
    assert!(matches!(config.validate(), Err(TsaError::Configuration(_))));
}

#[test]
fn test_swath_product_type_parses_but_is_unsupported() {
    let config = TsaConfig {
        product_type: "swath".to_string(),
        ..TsaConfig::default()
    };
    let resolved = config.validate().unwrap();
    assert_eq!(resolved.product_type, ProductType::Swath);

    let result = ProductDescriptor::new(resolved.product_type, None, "0.0.1", &resolved.time_unit);
    assert!(matches!(result, Err(TsaError::Unsupported(_))));
}

#[test]
fn test_missing_config_file() {
    let result = TsaConfig::from_file("/nonexistent/tsa_config.xml");
    assert!(matches!(result, Err(TsaError::Io(_))));
}

#[test]
fn test_malformed_config() {
    let result = TsaConfig::from_xml_str("<tsaConfig><parallel>maybe</parallel></tsaConfig>");
    assert!(matches!(result, Err(TsaError::XmlParsing(_))));
}

#[test]
fn test_snow_depth_threshold_reaches_accuracy_assessment() {
    let xml = r#"<tsaConfig><snowDepthThresholdCm>5</snowDepthThresholdCm></tsaConfig>"#;
    let resolved = TsaConfig::from_xml_str(xml).unwrap().validate().unwrap();
    let processor = tsa_snow::core::TsaProcessor::new(resolved);
    let assessor = processor.accuracy_assessor().unwrap();

    // 2 cm on the ground is below the configured threshold: snow-free reference
    let matchups = [Matchup { tsa: 0.0, snow_depth_cm: 2.0 }];
    let matrix = assessor.assess(&matchups);
    assert_eq!((matrix.tn, matrix.fn_), (1, 0));
}
