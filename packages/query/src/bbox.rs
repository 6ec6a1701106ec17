//! Geographic bounding box for sighting filters.
//!
//! The normalizer never validates bounds; the data provider owns that
//! decision. [`BoundingBox::validate`] exists for callers that want to
//! reject impossible boxes before a request goes out.

use serde::{Deserialize, Serialize};

/// A latitude/longitude box in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub lat_min: f64,
    /// Northern latitude boundary.
    pub lat_max: f64,
    /// Western longitude boundary.
    pub lon_min: f64,
    /// Eastern longitude boundary.
    pub lon_max: f64,
}

/// Reasons a [`BoundingBox`] fails strict validation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BoundsError {
    /// A latitude bound is outside `[-90, 90]` or not finite.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// The offending bound.
        value: f64,
    },

    /// A longitude bound is outside `[-180, 180]` or not finite.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// The offending bound.
        value: f64,
    },

    /// A minimum bound exceeds its maximum.
    #[error("{axis} minimum {min} exceeds maximum {max}")]
    Inverted {
        /// `"latitude"` or `"longitude"`.
        axis: &'static str,
        /// Supplied minimum.
        min: f64,
        /// Supplied maximum.
        max: f64,
    },
}

impl BoundingBox {
    /// Creates a new bounding box from the given bounds.
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Checks that every bound is a valid coordinate and that each
    /// minimum does not exceed its maximum.
    ///
    /// # Errors
    ///
    /// Returns the first [`BoundsError`] found.
    pub fn validate(&self) -> Result<(), BoundsError> {
        for value in [self.lat_min, self.lat_max] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(BoundsError::LatitudeOutOfRange { value });
            }
        }
        for value in [self.lon_min, self.lon_max] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(BoundsError::LongitudeOutOfRange { value });
            }
        }
        if self.lat_min > self.lat_max {
            return Err(BoundsError::Inverted {
                axis: "latitude",
                min: self.lat_min,
                max: self.lat_max,
            });
        }
        if self.lon_min > self.lon_max {
            return Err(BoundsError::Inverted {
                axis: "longitude",
                min: self.lon_min,
                max: self.lon_max,
            });
        }
        Ok(())
    }

    /// Returns `true` if the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }
}
