//! Sighting filter flags shared by the `query` and `sightings` commands.

use clap::Args;
use wildlife_map_query::{
    BoundingBox, BoundsError, FilterCriteria, NormalizedQuery, QueryError, normalize,
};

/// Errors raised while turning filter flags into a query.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A date-time flag did not parse.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// `--strict-bounds` rejected the bounding box.
    #[error("invalid bounding box: {0}")]
    Bounds(#[from] BoundsError),
}

/// Filter flags. Every flag is optional; omitted flags do not constrain
/// the result.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Species name (case-insensitive exact match)
    #[arg(long)]
    pub species: Option<String>,
    /// Camera identifier (e.g. "CAM-01")
    #[arg(long)]
    pub camera_id: Option<String>,
    /// Earliest sighting time, RFC 3339 or local "YYYY-MM-DDTHH:MM"
    #[arg(long)]
    pub start: Option<String>,
    /// Latest sighting time, RFC 3339 or local "YYYY-MM-DDTHH:MM"
    #[arg(long)]
    pub end: Option<String>,
    /// Southern latitude bound
    #[arg(long, allow_negative_numbers = true)]
    pub lat_min: Option<f64>,
    /// Northern latitude bound
    #[arg(long, allow_negative_numbers = true)]
    pub lat_max: Option<f64>,
    /// Western longitude bound
    #[arg(long, allow_negative_numbers = true)]
    pub lon_min: Option<f64>,
    /// Eastern longitude bound
    #[arg(long, allow_negative_numbers = true)]
    pub lon_max: Option<f64>,
    /// Reject bounds outside the valid coordinate ranges or with
    /// min > max instead of passing them to the provider
    #[arg(long)]
    pub strict_bounds: bool,
}

impl FilterArgs {
    /// The raw criteria as entered.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            species: self.species.clone(),
            camera_id: self.camera_id.clone(),
            start_timestamp: self.start.clone(),
            end_timestamp: self.end.clone(),
            lat_min: self.lat_min,
            lat_max: self.lat_max,
            lon_min: self.lon_min,
            lon_max: self.lon_max,
        }
    }

    /// Normalizes the flags into provider query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if a date-time does not parse, or if
    /// `--strict-bounds` is set and the bounds are invalid.
    pub fn to_query(&self) -> Result<NormalizedQuery, FilterError> {
        if self.strict_bounds {
            self.strict_box().validate()?;
        }
        Ok(normalize(&self.criteria())?)
    }

    /// Bounding box with omitted bounds opened to the full coordinate
    /// range.
    fn strict_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.lat_min.unwrap_or(-90.0),
            self.lat_max.unwrap_or(90.0),
            self.lon_min.unwrap_or(-180.0),
            self.lon_max.unwrap_or(180.0),
        )
    }
}
