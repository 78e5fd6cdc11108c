//! Configuration validation.

use crate::config::Config;
use crate::constants::{map, model, service_area};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_model(config)?;
    validate_map(config)?;
    Ok(())
}

/// Validate detector settings.
fn validate_model(config: &Config) -> Result<()> {
    let model_config = &config.model;

    if !(0.0..=1.0).contains(&model_config.min_confidence) {
        return Err(Error::ConfigValidation {
            message: format!(
                "model.min_confidence must be between 0.0 and 1.0, got {}",
                model_config.min_confidence
            ),
        });
    }

    if !(0.0..=1.0).contains(&model_config.iou_threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "model.iou_threshold must be between 0.0 and 1.0, got {}",
                model_config.iou_threshold
            ),
        });
    }

    if model_config.input_size == 0
        || model_config.input_size % model::STRIDE != 0
        || model_config.input_size > model::MAX_INPUT_SIZE
    {
        return Err(Error::ConfigValidation {
            message: format!(
                "model.input_size must be a positive multiple of {} up to {}, got {}",
                model::STRIDE,
                model::MAX_INPUT_SIZE,
                model_config.input_size
            ),
        });
    }

    if model_config.class_names.is_empty() {
        return Err(Error::ConfigValidation {
            message: "model.class_names must list at least one class".to_string(),
        });
    }

    Ok(())
}

/// Validate map settings.
fn validate_map(config: &Config) -> Result<()> {
    let map_config = &config.map;

    if !(service_area::MIN_LATITUDE..=service_area::MAX_LATITUDE)
        .contains(&map_config.center_latitude)
        || !(service_area::MIN_LONGITUDE..=service_area::MAX_LONGITUDE)
            .contains(&map_config.center_longitude)
    {
        return Err(Error::ConfigValidation {
            message: format!(
                "map centre ({}, {}) lies outside the service area",
                map_config.center_latitude, map_config.center_longitude
            ),
        });
    }

    for (name, zoom) in [
        ("overview_zoom", map_config.overview_zoom),
        ("point_zoom", map_config.point_zoom),
    ] {
        if !(1..=map::MAX_ZOOM).contains(&zoom) {
            return Err(Error::ConfigValidation {
                message: format!("map.{name} must be between 1 and {}, got {zoom}", map::MAX_ZOOM),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_confidence() {
        let mut config = Config::default();
        config.model.min_confidence = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_iou() {
        let mut config = Config::default();
        config.model.iou_threshold = -0.1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_input_size_must_match_stride() {
        let mut config = Config::default();
        config.model.input_size = 600;
        assert!(validate_config(&config).is_err());
        config.model.input_size = 0;
        assert!(validate_config(&config).is_err());
        config.model.input_size = 320;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_input_size_upper_bound() {
        let mut config = Config::default();
        config.model.input_size = 4096;
        assert!(validate_config(&config).is_ok());
        config.model.input_size = 4128;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("up to 4096"));
        config.model.input_size = 65_536;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_class_names() {
        let mut config = Config::default();
        config.model.class_names.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_map_centre_outside_area() {
        let mut config = Config::default();
        config.map.center_latitude = 40.7;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_validate_zoom_range() {
        let mut config = Config::default();
        config.map.point_zoom = 25;
        assert!(validate_config(&config).is_err());
        config.map.point_zoom = 0;
        assert!(validate_config(&config).is_err());
    }
}
