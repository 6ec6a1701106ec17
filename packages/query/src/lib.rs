#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Translates user-entered sighting filters into normalized API query
//! parameters.
//!
//! [`normalize`] turns a [`FilterCriteria`] into a [`NormalizedQuery`] that
//! holds only the parameters the user actually supplied. Omitting a
//! parameter always means "unconstrained". Date-times are re-encoded as
//! absolute UTC instants, and bounding-box bounds are renamed to the
//! provider's `latitude__gte`-style lookups.

pub mod bbox;
pub mod timestamp;

use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

pub use bbox::{BoundingBox, BoundsError};

/// Errors produced while normalizing filter criteria.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A date-time filter was supplied but could not be parsed.
    #[error("invalid timestamp for `{field}`: {value:?}")]
    InvalidTimestamp {
        /// The filter field that failed.
        field: QueryParam,
        /// The text as entered.
        value: String,
    },
}

/// Name of a query parameter accepted by the observation endpoint.
///
/// Variant order is the order parameters are serialized in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum QueryParam {
    /// Species label (case-insensitive exact match upstream).
    Species,
    /// Camera identifier (exact match).
    CameraId,
    /// Earliest sighting instant, inclusive.
    StartTimestamp,
    /// Latest sighting instant, inclusive.
    EndTimestamp,
    /// Southern latitude bound, inclusive.
    #[strum(serialize = "latitude__gte")]
    LatitudeGte,
    /// Northern latitude bound, inclusive.
    #[strum(serialize = "latitude__lte")]
    LatitudeLte,
    /// Western longitude bound, inclusive.
    #[strum(serialize = "longitude__gte")]
    LongitudeGte,
    /// Eastern longitude bound, inclusive.
    #[strum(serialize = "longitude__lte")]
    LongitudeLte,
}

impl QueryParam {
    /// Returns the wire name of this parameter.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Filter form state as entered by the user. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Species label.
    pub species: Option<String>,
    /// Camera identifier.
    pub camera_id: Option<String>,
    /// Start of the time window, as a local date-time.
    pub start_timestamp: Option<String>,
    /// End of the time window, as a local date-time.
    pub end_timestamp: Option<String>,
    /// Minimum latitude.
    pub lat_min: Option<f64>,
    /// Maximum latitude.
    pub lat_max: Option<f64>,
    /// Minimum longitude.
    pub lon_min: Option<f64>,
    /// Maximum longitude.
    pub lon_max: Option<f64>,
}

impl FilterCriteria {
    /// Returns the bounding box when all four bounds are supplied.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        Some(BoundingBox::new(
            self.lat_min?,
            self.lat_max?,
            self.lon_min?,
            self.lon_max?,
        ))
    }
}

/// Canonical query parameters: only what was supplied, nothing defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    params: BTreeMap<QueryParam, String>,
}

impl NormalizedQuery {
    /// Creates an empty (unconstrained) query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            params: BTreeMap::new(),
        }
    }

    /// Returns the value of `param`, if it was supplied.
    #[must_use]
    pub fn get(&self, param: QueryParam) -> Option<&str> {
        self.params.get(&param).map(String::as_str)
    }

    /// Returns `true` if `param` was supplied.
    #[must_use]
    pub fn contains(&self, param: QueryParam) -> bool {
        self.params.contains_key(&param)
    }

    /// Number of supplied parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no parameter was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates `(wire name, value)` pairs in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.params
            .iter()
            .map(|(param, value)| (param.name(), value.as_str()))
    }

    /// Encodes the query as `application/x-www-form-urlencoded` text,
    /// without a leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    fn insert(&mut self, param: QueryParam, value: String) {
        self.params.insert(param, value);
    }
}

impl Serialize for NormalizedQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Normalizes `criteria`, reading naive date-times in the process-local
/// timezone.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTimestamp`] if a supplied date-time does
/// not parse.
pub fn normalize(criteria: &FilterCriteria) -> Result<NormalizedQuery, QueryError> {
    normalize_in(criteria, &Local)
}

/// Normalizes `criteria`, reading naive date-times in `tz`.
///
/// Bounds are passed through without range validation; see
/// [`BoundingBox::validate`] for an opt-in check.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTimestamp`] if a supplied date-time does
/// not parse.
pub fn normalize_in<Tz: TimeZone>(
    criteria: &FilterCriteria,
    tz: &Tz,
) -> Result<NormalizedQuery, QueryError> {
    let mut query = NormalizedQuery::new();

    for (param, text) in [
        (QueryParam::Species, &criteria.species),
        (QueryParam::CameraId, &criteria.camera_id),
    ] {
        if let Some(text) = text.as_deref().filter(|s| !s.is_empty()) {
            query.insert(param, text.to_string());
        }
    }

    for (param, raw) in [
        (QueryParam::StartTimestamp, &criteria.start_timestamp),
        (QueryParam::EndTimestamp, &criteria.end_timestamp),
    ] {
        let Some(raw) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let instant =
            timestamp::parse_local(raw, tz).ok_or_else(|| QueryError::InvalidTimestamp {
                field: param,
                value: raw.to_string(),
            })?;
        query.insert(param, timestamp::format_utc(&instant));
    }

    for (param, bound) in [
        (QueryParam::LatitudeGte, criteria.lat_min),
        (QueryParam::LatitudeLte, criteria.lat_max),
        (QueryParam::LongitudeGte, criteria.lon_min),
        (QueryParam::LongitudeLte, criteria.lon_max),
    ] {
        let Some(bound) = bound else {
            continue;
        };
        if !bound.is_finite() {
            log::warn!("Ignoring non-finite {param} bound {bound}");
            continue;
        }
        query.insert(param, bound.to_string());
    }

    log::debug!("Normalized filter to {} parameter(s)", query.len());

    Ok(query)
}
