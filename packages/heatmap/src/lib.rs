#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sighting aggregation and heat-intensity computation for the wildlife
//! density map.
//!
//! Observations are grouped into buckets keyed by their location rounded
//! to 4 decimal places (~11 m) and their species. Each bucket's counts are
//! summed, and the sum is normalized against the largest bucket to give an
//! intensity in `[0.1, 1.0]`:
//!
//! ```text
//! intensity = 0.1 + (total_count / max_count) * 0.9
//! ```
//!
//! The maximum is taken over every bucket before the visibility mask is
//! applied, so hiding a species never changes the intensity of another.
//! Every call recomputes from scratch; nothing is cached between runs.

pub mod render;

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

use wildlife_map_heatmap_models::{AggregatedPoint, Aggregation, VisibilityMask};
use wildlife_map_sighting_models::{ObservationRecord, RawObservation};

pub use wildlife_map_heatmap_models as models;

/// Lowest intensity a bucket can receive.
pub const MIN_INTENSITY: f64 = 0.1;

/// Highest intensity a bucket can receive.
pub const MAX_INTENSITY: f64 = 1.0;

/// Number of decimal places coordinates are rounded to before grouping.
pub const COORDINATE_DECIMALS: usize = 4;

/// Rounded coordinate units per degree (`10^COORDINATE_DECIMALS`).
const UNITS_PER_DEGREE: f64 = 10_000.0;

/// Bucket identity. Coordinates are stored as whole 1e-4 degree units so
/// the key is exact and `-0.0000` collapses onto `0.0000`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BucketKey {
    species: String,
    lat_units: i64,
    lon_units: i64,
}

/// Aggregates raw provider records for the density map.
///
/// Records that fail coercion (non-numeric or out-of-range coordinates,
/// invalid counts, empty species) are logged and skipped; the number
/// skipped is reported in [`Aggregation::skipped`].
#[must_use]
pub fn aggregate(records: &[RawObservation], mask: &VisibilityMask) -> Aggregation {
    let mut skipped = 0;

    let coerced = records.iter().filter_map(|raw| match raw.coerce() {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Skipping {e}");
            skipped += 1;
            None
        }
    });
    let buckets = build_buckets(coerced);

    finish(buckets, mask, skipped, records.len())
}

/// Aggregates records that are already typed.
///
/// Records with non-finite coordinates are skipped and counted like
/// malformed raw records.
#[must_use]
pub fn aggregate_records(records: &[ObservationRecord], mask: &VisibilityMask) -> Aggregation {
    let mut skipped = 0;

    let usable = records.iter().filter(|record| {
        let ok = record.latitude.is_finite() && record.longitude.is_finite();
        if !ok {
            log::warn!(
                "Skipping record {:?}: non-finite coordinates ({}, {})",
                record.id,
                record.latitude,
                record.longitude
            );
            skipped += 1;
        }
        ok
    });
    let buckets = build_buckets(usable);

    finish(buckets, mask, skipped, records.len())
}

/// Rounds a coordinate to [`COORDINATE_DECIMALS`] places.
///
/// The value is formatted as fixed-point text and parsed back, so the
/// result is exactly what a 4-place decimal representation denotes.
/// Halfway cases round away from zero, so `1.03125` becomes `1.0313` and
/// `-0.03125` becomes `-0.0313`.
#[must_use]
pub fn round_coordinate(value: f64) -> f64 {
    units_to_degrees(degrees_to_units(value))
}

/// Computes the intensity of a bucket holding `total_count` individuals
/// when the largest bucket holds `max_count`.
///
/// `max_count` is floored at 1. The result is in
/// `[MIN_INTENSITY, MAX_INTENSITY]` whenever `total_count <= max_count`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn intensity(total_count: u64, max_count: u64) -> f64 {
    let ratio = total_count as f64 / max_count.max(1) as f64;
    ratio.mul_add(MAX_INTENSITY - MIN_INTENSITY, MIN_INTENSITY)
}

#[allow(clippy::cast_possible_truncation)]
fn degrees_to_units(value: f64) -> i64 {
    if is_exact_tie(value) {
        // Exact in binary, and `f64::round` breaks ties away from zero.
        return (value * UNITS_PER_DEGREE).round() as i64;
    }

    let text = format!("{value:.prec$}", prec = COORDINATE_DECIMALS);
    let rounded = text.parse::<f64>().unwrap_or(value);
    (rounded * UNITS_PER_DEGREE).round() as i64
}

/// Whether `value` lies exactly halfway between two 4-place decimals.
///
/// A halfway point is an odd multiple of `1 / 20000`. It only has an
/// exact binary value when it is also an odd multiple of `1 / 32`.
fn is_exact_tie(value: f64) -> bool {
    let scaled = value * 32.0;
    scaled.fract() == 0.0 && scaled % 2.0 != 0.0
}

#[allow(clippy::cast_precision_loss)]
fn units_to_degrees(units: i64) -> f64 {
    units as f64 / UNITS_PER_DEGREE
}

fn build_buckets<R>(records: impl Iterator<Item = R>) -> BTreeMap<BucketKey, u64>
where
    R: Borrow<ObservationRecord>,
{
    let mut buckets: BTreeMap<BucketKey, u64> = BTreeMap::new();

    for record in records {
        let record = record.borrow();
        let key = BucketKey {
            species: record.species.clone(),
            lat_units: degrees_to_units(record.latitude),
            lon_units: degrees_to_units(record.longitude),
        };
        let total = buckets.entry(key).or_insert(0);
        *total = total.saturating_add(record.count);
    }

    buckets
}

fn finish(
    buckets: BTreeMap<BucketKey, u64>,
    mask: &VisibilityMask,
    skipped: usize,
    input_len: usize,
) -> Aggregation {
    let max_count = buckets.values().copied().max().unwrap_or(0).max(1);
    let species: BTreeSet<String> = buckets.keys().map(|key| key.species.clone()).collect();
    let bucket_count = buckets.len();

    let points: Vec<AggregatedPoint> = buckets
        .into_iter()
        .filter(|(key, _)| mask.is_visible(&key.species))
        .map(|(key, total_count)| AggregatedPoint {
            latitude: units_to_degrees(key.lat_units),
            longitude: units_to_degrees(key.lon_units),
            intensity: intensity(total_count, max_count),
            species: key.species,
            total_count,
        })
        .collect();

    log::debug!(
        "Aggregated {input_len} records into {bucket_count} buckets \
         ({} visible, max count {max_count}, {skipped} skipped)",
        points.len(),
    );

    Aggregation {
        points,
        max_count,
        skipped,
        species,
    }
}
