#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation, camera and summary record types for the wildlife map.
//!
//! The observation API serializes its decimal columns as JSON strings
//! (`"1.282700"`), so observations arrive as [`RawObservation`] values and
//! are coerced record-by-record into typed [`ObservationRecord`]s. A record
//! that fails coercion produces a [`MalformedRecord`] instead of failing
//! the whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod decimal;

/// Valid latitude range in decimal degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in decimal degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Opaque record identifier as issued by the data provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric primary key.
    Int(i64),
    /// Any other textual identifier.
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A single sighting event, coerced and range-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Provider-issued identifier.
    pub id: Option<RecordId>,
    /// Species label (never empty).
    pub species: String,
    /// Number of individuals observed.
    pub count: u64,
    /// Latitude in decimal degrees, within [`LATITUDE_RANGE`].
    pub latitude: f64,
    /// Longitude in decimal degrees, within [`LONGITUDE_RANGE`].
    pub longitude: f64,
    /// When the sighting happened. `None` if the provider sent no
    /// parsable instant.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-text behaviour description.
    pub behaviour: Option<String>,
    /// Camera that recorded the sighting.
    pub camera_id: Option<String>,
}

/// An observation exactly as the data provider sends it.
///
/// Numeric fields stay untyped until [`RawObservation::coerce`] runs, so a
/// single bad value only disqualifies its own record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Provider-issued identifier.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Species label.
    #[serde(default)]
    pub species: Option<String>,
    /// Individual count (number or numeric string).
    #[serde(default)]
    pub count: Value,
    /// Latitude (number or numeric string).
    #[serde(default)]
    pub latitude: Value,
    /// Longitude (number or numeric string).
    #[serde(default)]
    pub longitude: Value,
    /// RFC 3339 instant.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Free-text behaviour description.
    #[serde(default)]
    pub behaviour: Option<String>,
    /// Camera that recorded the sighting.
    #[serde(default)]
    pub camera_id: Option<String>,
}

/// Why an observation could not be coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedReason {
    /// A required field was absent or `null`.
    #[error("missing field `{field}`")]
    Missing {
        /// Field name.
        field: &'static str,
    },

    /// A numeric field held something that is not a number.
    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric {
        /// Field name.
        field: &'static str,
        /// The offending JSON value.
        value: String,
    },

    /// A coordinate was NaN, infinite, or outside its valid range.
    #[error("field `{field}` is out of range: {value}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The individual count was negative or fractional.
    #[error("count must be a non-negative integer, got {value}")]
    InvalidCount {
        /// The offending count as sent.
        value: String,
    },

    /// The species label was empty.
    #[error("species is empty")]
    EmptySpecies,
}

/// An observation that was skipped because one of its fields was unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed record {}: {reason}", record_label(.id.as_ref()))]
pub struct MalformedRecord {
    /// Identifier of the skipped record, if it had one.
    pub id: Option<RecordId>,
    /// What was wrong with it.
    #[source]
    pub reason: MalformedReason,
}

fn record_label(id: Option<&RecordId>) -> String {
    id.map_or_else(|| "<no id>".to_string(), ToString::to_string)
}

impl RawObservation {
    /// Coerces this wire record into a typed [`ObservationRecord`].
    ///
    /// Coordinates and counts may be JSON numbers or numeric strings.
    /// The timestamp is descriptive only; an unparsable one becomes `None`
    /// rather than rejecting the record.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRecord`] if a coordinate or the count is missing,
    /// non-numeric or out of range, or if the species is empty.
    pub fn coerce(&self) -> Result<ObservationRecord, MalformedRecord> {
        self.coerce_inner().map_err(|reason| MalformedRecord {
            id: self.id.clone(),
            reason,
        })
    }

    fn coerce_inner(&self) -> Result<ObservationRecord, MalformedReason> {
        let species = self
            .species
            .as_deref()
            .ok_or(MalformedReason::Missing { field: "species" })?;
        if species.trim().is_empty() {
            return Err(MalformedReason::EmptySpecies);
        }

        let latitude = coerce_coordinate(&self.latitude, "latitude", &LATITUDE_RANGE)?;
        let longitude = coerce_coordinate(&self.longitude, "longitude", &LONGITUDE_RANGE)?;
        let count = coerce_count(&self.count)?;

        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ObservationRecord {
            id: self.id.clone(),
            species: species.to_string(),
            count,
            latitude,
            longitude,
            timestamp,
            behaviour: self.behaviour.clone(),
            camera_id: self.camera_id.clone(),
        })
    }
}

fn coerce_coordinate(
    value: &Value,
    field: &'static str,
    range: &std::ops::RangeInclusive<f64>,
) -> Result<f64, MalformedReason> {
    if value.is_null() {
        return Err(MalformedReason::Missing { field });
    }

    let parsed = decimal::from_value(value).ok_or_else(|| MalformedReason::NotNumeric {
        field,
        value: value.to_string(),
    })?;

    if !parsed.is_finite() || !range.contains(&parsed) {
        return Err(MalformedReason::OutOfRange {
            field,
            value: parsed,
        });
    }

    Ok(parsed)
}

fn coerce_count(value: &Value) -> Result<u64, MalformedReason> {
    match value {
        Value::Null => Err(MalformedReason::Missing { field: "count" }),
        Value::Number(n) => n.as_u64().map_or_else(
            || {
                // Whole-valued floats (`3.0`) are still valid counts.
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .and_then(float_to_count)
                    .ok_or_else(|| MalformedReason::InvalidCount {
                        value: n.to_string(),
                    })
            },
            Ok,
        ),
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| {
            if decimal::from_value(value).is_some() {
                MalformedReason::InvalidCount { value: s.clone() }
            } else {
                MalformedReason::NotNumeric {
                    field: "count",
                    value: value.to_string(),
                }
            }
        }),
        other => Err(MalformedReason::NotNumeric {
            field: "count",
            value: other.to_string(),
        }),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn float_to_count(value: f64) -> Option<u64> {
    (value <= u64::MAX as f64).then_some(value as u64)
}

/// A registered camera trap, passed through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// Provider-issued identifier.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Human-facing camera identifier (e.g. `"CAM-01"`).
    pub camera_id: String,
    /// Latitude in decimal degrees.
    #[serde(deserialize_with = "decimal::deserialize")]
    pub latitude: f64,
    /// Longitude in decimal degrees.
    #[serde(deserialize_with = "decimal::deserialize")]
    pub longitude: f64,
    /// When the camera was registered.
    #[serde(default)]
    pub addtime: Option<DateTime<Utc>>,
}

/// Label of a year bucket in the yearly summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearLabel {
    /// Calendar year.
    Number(i32),
    /// Any other label the provider uses.
    Text(String),
}

impl std::fmt::Display for YearLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(year) => write!(f, "{year}"),
            Self::Text(year) => f.write_str(year),
        }
    }
}

/// One point of the yearly population summary for a species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummaryPoint {
    /// Year bucket.
    pub year: YearLabel,
    /// Individuals counted in that year.
    pub count: u64,
}
