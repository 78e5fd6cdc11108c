//! Coordinate validation against the fixed service area.

use crate::constants::service_area::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};
use std::fmt;

/// Why a pair of coordinates was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    /// Latitude or longitude was empty or whitespace only.
    #[error("coordinates cannot be empty")]
    Empty,

    /// A value is not a plain decimal number.
    #[error("coordinates must be plain decimal numbers (e.g. 8.9943 and -79.5188)")]
    NotNumeric,

    /// Latitude outside the service area.
    #[error(
        "latitude out of range ({min}° to {max}° N), got {value}°",
        min = MIN_LATITUDE,
        max = MAX_LATITUDE
    )]
    LatitudeOutOfRange {
        /// Rejected latitude.
        value: f64,
    },

    /// Longitude outside the service area.
    #[error(
        "longitude out of range ({min}° to {max}°), got {value}°",
        min = MIN_LONGITUDE,
        max = MAX_LONGITUDE
    )]
    LongitudeOutOfRange {
        /// Rejected longitude.
        value: f64,
    },
}

/// A latitude/longitude pair known to lie inside the service area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Check numeric coordinates against the service area.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange { value: latitude });
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Validate raw latitude/longitude text as typed by the user.
///
/// Both values are trimmed, must look like `-?digits[.digits]`, and must
/// fall inside the service area. The parsed values are returned unchanged.
pub fn validate_coordinates(latitude: &str, longitude: &str) -> Result<Coordinates, CoordinateError> {
    let latitude = latitude.trim();
    let longitude = longitude.trim();

    if latitude.is_empty() || longitude.is_empty() {
        return Err(CoordinateError::Empty);
    }

    if !is_plain_decimal(latitude) || !is_plain_decimal(longitude) {
        return Err(CoordinateError::NotNumeric);
    }

    let lat: f64 = latitude.parse().map_err(|_| CoordinateError::NotNumeric)?;
    let lon: f64 = longitude.parse().map_err(|_| CoordinateError::NotNumeric)?;

    Coordinates::new(lat, lon)
}

/// Match `^-?\d+\.?\d*$` on ASCII digits.
fn is_plain_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates_return_exact_values() {
        let coords = validate_coordinates("8.9943", "-79.5188").unwrap();
        assert_eq!(coords.latitude(), 8.9943);
        assert_eq!(coords.longitude(), -79.5188);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_coordinates("7.0", "-83.0").is_ok());
        assert!(validate_coordinates("10", "-77").is_ok());
        assert!(validate_coordinates("10.", "-77.").is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let coords = validate_coordinates("  9.0 ", "\t-80.0\n").unwrap();
        assert_eq!(coords.latitude(), 9.0);
        assert_eq!(coords.longitude(), -80.0);
    }

    #[test]
    fn test_grid_inside_service_area_is_accepted() {
        for lat_step in 0..=30 {
            for lon_step in 0..=60 {
                let lat = 7.0 + f64::from(lat_step) * 0.1;
                let lon = -83.0 + f64::from(lon_step) * 0.1;
                let lat_text = format!("{lat:.1}");
                let lon_text = format!("{lon:.1}");
                let coords = validate_coordinates(&lat_text, &lon_text).unwrap();
                assert_eq!(coords.latitude(), lat_text.parse::<f64>().unwrap());
                assert_eq!(coords.longitude(), lon_text.parse::<f64>().unwrap());
            }
        }
    }

    #[test]
    fn test_empty_values_rejected() {
        assert_eq!(validate_coordinates("", "-80"), Err(CoordinateError::Empty));
        assert_eq!(validate_coordinates("9", "   "), Err(CoordinateError::Empty));
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        for (lat, lon) in [
            ("abc", "-80"),
            ("9", "west"),
            ("9,5", "-80"),
            ("+9", "-80"),
            (".5", "-80"),
            ("9", "--80"),
            ("1e1", "-80"),
            ("9.0.1", "-80"),
            ("-", "-80"),
        ] {
            assert_eq!(
                validate_coordinates(lat, lon),
                Err(CoordinateError::NotNumeric),
                "{lat:?}, {lon:?}"
            );
        }
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert_eq!(
            validate_coordinates("6.99", "-80"),
            Err(CoordinateError::LatitudeOutOfRange { value: 6.99 })
        );
        assert_eq!(
            validate_coordinates("10.01", "-80"),
            Err(CoordinateError::LatitudeOutOfRange { value: 10.01 })
        );
    }

    #[test]
    fn test_longitude_out_of_range() {
        assert_eq!(
            validate_coordinates("9", "-83.5"),
            Err(CoordinateError::LongitudeOutOfRange { value: -83.5 })
        );
        assert_eq!(
            validate_coordinates("9", "80"),
            Err(CoordinateError::LongitudeOutOfRange { value: 80.0 })
        );
    }

    #[test]
    fn test_latitude_checked_before_longitude() {
        assert!(matches!(
            validate_coordinates("50", "50"),
            Err(CoordinateError::LatitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_numeric_constructor_applies_range_checks() {
        assert!(matches!(
            Coordinates::new(50.0, 50.0),
            Err(CoordinateError::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            Coordinates::new(9.0, 50.0),
            Err(CoordinateError::LongitudeOutOfRange { .. })
        ));
        let inside = Coordinates::new(9.0, -80.0).unwrap();
        assert_eq!(inside.to_string(), "9.000000, -80.000000");
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        assert!(CoordinateError::Empty.to_string().contains("empty"));
        assert!(CoordinateError::NotNumeric.to_string().contains("numbers"));
        assert!(
            CoordinateError::LatitudeOutOfRange { value: 1.0 }
                .to_string()
                .contains("latitude")
        );
        assert!(
            CoordinateError::LongitudeOutOfRange { value: 1.0 }
                .to_string()
                .contains("longitude")
        );
    }
}
