#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregated heat-map point types and the species visibility mask.
//!
//! These are the output shapes of `wildlife_map_heatmap`. They are kept in
//! their own crate so renderers and front ends can depend on them without
//! pulling in the aggregation code.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One bucket of sightings: a rounded location and a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    /// Latitude rounded to 4 decimal places.
    pub latitude: f64,
    /// Longitude rounded to 4 decimal places.
    pub longitude: f64,
    /// Species label shared by every member of the bucket.
    pub species: String,
    /// Sum of individual counts over the bucket's observations.
    pub total_count: u64,
    /// Normalized weight in `[0.1, 1.0]`.
    pub intensity: f64,
}

impl AggregatedPoint {
    /// Returns the renderer-facing triple for this point.
    #[must_use]
    pub const fn heat_point(&self) -> HeatPoint {
        HeatPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            intensity: self.intensity,
        }
    }
}

/// A `(latitude, longitude, intensity)` triple for a density renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Weight in `[0.1, 1.0]`.
    pub intensity: f64,
}

impl From<HeatPoint> for [f64; 3] {
    fn from(point: HeatPoint) -> Self {
        [point.latitude, point.longitude, point.intensity]
    }
}

/// The full result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Points for visible species, sorted by species then location.
    pub points: Vec<AggregatedPoint>,
    /// Largest bucket total across all species (visible or not), floored
    /// at 1.
    pub max_count: u64,
    /// Number of input records skipped as malformed.
    pub skipped: usize,
    /// Every species that produced a bucket, including masked ones.
    pub species: BTreeSet<String>,
}

impl Aggregation {
    /// Returns the renderer-facing triples for every visible point.
    #[must_use]
    pub fn heat_points(&self) -> Vec<HeatPoint> {
        self.points.iter().map(AggregatedPoint::heat_point).collect()
    }

    /// Returns `true` if no point survived aggregation and masking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of `total_count` over the visible points.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.points.iter().map(|p| p.total_count).sum()
    }
}

/// Rendering parameters for a heat layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatLayerOptions {
    /// Radius of each point's influence, in pixels.
    pub radius: u32,
    /// Blur amount, in pixels.
    pub blur: u32,
    /// Zoom level at which points reach full intensity.
    pub max_zoom: u8,
}

impl Default for HeatLayerOptions {
    fn default() -> Self {
        Self {
            radius: 25,
            blur: 15,
            max_zoom: 18,
        }
    }
}

/// Per-species visibility. Species without an entry are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityMask {
    entries: BTreeMap<String, bool>,
}

impl VisibilityMask {
    /// Creates an empty mask (everything visible).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a mask with an explicit `true` entry for every species.
    #[must_use]
    pub fn all_visible<I, S>(species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        species.into_iter().map(|s| (s.into(), true)).collect()
    }

    /// Returns whether `species` should be drawn.
    #[must_use]
    pub fn is_visible(&self, species: &str) -> bool {
        self.entries.get(species).copied().unwrap_or(true)
    }

    /// Sets the visibility of `species`.
    pub fn set(&mut self, species: impl Into<String>, visible: bool) {
        self.entries.insert(species.into(), visible);
    }

    /// Hides `species`.
    pub fn hide(&mut self, species: impl Into<String>) {
        self.set(species, false);
    }

    /// Shows `species`.
    pub fn show(&mut self, species: impl Into<String>) {
        self.set(species, true);
    }

    /// Flips the visibility of `species` and returns the new state.
    pub fn toggle(&mut self, species: &str) -> bool {
        let visible = !self.is_visible(species);
        self.set(species, visible);
        visible
    }

    /// Species with an explicit entry, in sorted order.
    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Species explicitly masked off, in sorted order.
    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(species, _)| species.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for VisibilityMask {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(s, v)| (s.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_species_default_to_visible() {
        let mask = VisibilityMask::new();
        assert!(mask.is_visible("Lion"));
    }

    #[test]
    fn toggle_flips_and_reports_state() {
        let mut mask = VisibilityMask::all_visible(["Lion", "Elephant"]);
        assert!(!mask.toggle("Lion"));
        assert!(!mask.is_visible("Lion"));
        assert!(mask.toggle("Lion"));
        assert!(mask.is_visible("Lion"));

        // Toggling an unknown species hides it first.
        assert!(!mask.toggle("Giraffe"));
        assert_eq!(mask.hidden().collect::<Vec<_>>(), vec!["Giraffe"]);
    }

    #[test]
    fn species_are_listed_sorted() {
        let mask = VisibilityMask::all_visible(["Zebra", "Elephant", "Lion"]);
        assert_eq!(
            mask.species().collect::<Vec<_>>(),
            vec!["Elephant", "Lion", "Zebra"]
        );
    }

    #[test]
    fn mask_serializes_as_plain_map() {
        let mut mask = VisibilityMask::new();
        mask.hide("Lion");
        mask.show("Elephant");
        assert_eq!(
            serde_json::to_value(&mask).unwrap(),
            serde_json::json!({ "Elephant": true, "Lion": false })
        );
    }

    #[test]
    fn heat_point_converts_to_triple() {
        let point = AggregatedPoint {
            latitude: 1.29,
            longitude: 36.82,
            species: "Lion".to_string(),
            total_count: 5,
            intensity: 0.325,
        };
        let triple: [f64; 3] = point.heat_point().into();
        assert_eq!(triple, [1.29, 36.82, 0.325]);
        assert_eq!(
            serde_json::to_value(&point).unwrap()["totalCount"],
            serde_json::json!(5)
        );
    }

    #[test]
    fn heat_layer_options_fill_defaults() {
        let options: HeatLayerOptions =
            serde_json::from_value(serde_json::json!({ "radius": 30 })).unwrap();
        assert_eq!(
            options,
            HeatLayerOptions {
                radius: 30,
                blur: 15,
                max_zoom: 18,
            }
        );
    }
}
