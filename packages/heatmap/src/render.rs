//! Heat-layer rendering port.
//!
//! The aggregation code does not draw anything. It hands
//! [`HeatPoint`]s and [`HeatLayerOptions`] to a [`HeatLayerRenderer`],
//! which replaces whatever layer it was showing. An empty point list
//! clears the layer.

use std::io::Write;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use wildlife_map_heatmap_models::{HeatLayerOptions, HeatPoint};

/// Errors raised while producing a heat layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing the layer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the layer failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something that can display a density layer.
///
/// Each call replaces the previous layer entirely.
pub trait HeatLayerRenderer {
    /// Replaces the current layer with `points`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the layer cannot be produced.
    fn render(&mut self, points: &[HeatPoint], options: &HeatLayerOptions)
    -> Result<(), RenderError>;
}

/// Renders heat points as a `GeoJSON` `FeatureCollection` of weighted
/// `Point` features.
///
/// Each feature carries an `intensity` property. The layer options are
/// attached to the collection as `radius`, `blur` and `maxZoom` members
/// so a web map can configure its heat plugin from the file alone.
#[derive(Debug, Default)]
pub struct GeoJsonHeatLayer {
    layer: Option<FeatureCollection>,
}

impl GeoJsonHeatLayer {
    /// Creates a renderer with no layer.
    #[must_use]
    pub const fn new() -> Self {
        Self { layer: None }
    }

    /// The layer currently shown, if any.
    #[must_use]
    pub const fn layer(&self) -> Option<&FeatureCollection> {
        self.layer.as_ref()
    }

    /// Returns `true` when no layer is shown.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.layer.is_none()
    }

    /// Writes the current layer as pretty-printed `GeoJSON`.
    ///
    /// A cleared layer is written as an empty `FeatureCollection`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if serialization or the write fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), RenderError> {
        let empty = FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        };
        let collection = self.layer.as_ref().unwrap_or(&empty);

        serde_json::to_writer_pretty(&mut writer, collection)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl HeatLayerRenderer for GeoJsonHeatLayer {
    fn render(
        &mut self,
        points: &[HeatPoint],
        options: &HeatLayerOptions,
    ) -> Result<(), RenderError> {
        if points.is_empty() {
            log::debug!("Clearing heat layer");
            self.layer = None;
            return Ok(());
        }

        let features = points.iter().map(point_feature).collect();

        let mut members = JsonObject::new();
        members.insert("radius".to_string(), options.radius.into());
        members.insert("blur".to_string(), options.blur.into());
        members.insert("maxZoom".to_string(), options.max_zoom.into());

        log::debug!("Rendering heat layer with {} points", points.len());

        self.layer = Some(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        });
        Ok(())
    }
}

fn point_feature(point: &HeatPoint) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("intensity".to_string(), point.intensity.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            point.longitude,
            point.latitude,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64, intensity: f64) -> HeatPoint {
        HeatPoint {
            latitude,
            longitude,
            intensity,
        }
    }

    #[test]
    fn renders_points_in_lon_lat_order() {
        let mut renderer = GeoJsonHeatLayer::new();
        renderer
            .render(&[point(1.29, 36.82, 0.325)], &HeatLayerOptions::default())
            .unwrap();

        let layer = renderer.layer().unwrap();
        assert_eq!(layer.features.len(), 1);

        let feature = &layer.features[0];
        let Some(Geometry {
            value: Value::Point(coords),
            ..
        }) = &feature.geometry
        else {
            panic!("expected a point geometry");
        };
        assert_eq!(coords, &vec![36.82, 1.29]);
        assert_eq!(
            feature.properties.as_ref().unwrap()["intensity"],
            serde_json::json!(0.325)
        );
    }

    #[test]
    fn options_are_attached_to_collection() {
        let mut renderer = GeoJsonHeatLayer::new();
        let options = HeatLayerOptions {
            radius: 30,
            blur: 10,
            max_zoom: 12,
        };
        renderer.render(&[point(0.0, 0.0, 1.0)], &options).unwrap();

        let members = renderer
            .layer()
            .unwrap()
            .foreign_members
            .as_ref()
            .unwrap();
        assert_eq!(members["radius"], serde_json::json!(30));
        assert_eq!(members["blur"], serde_json::json!(10));
        assert_eq!(members["maxZoom"], serde_json::json!(12));
    }

    #[test]
    fn empty_render_clears_layer() {
        let mut renderer = GeoJsonHeatLayer::new();
        let options = HeatLayerOptions::default();
        renderer.render(&[point(0.0, 0.0, 1.0)], &options).unwrap();
        assert!(!renderer.is_empty());

        renderer.render(&[], &options).unwrap();
        assert!(renderer.is_empty());

        let mut out = Vec::new();
        renderer.write_to(&mut out).unwrap();
        let written: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(written["type"], "FeatureCollection");
        assert_eq!(written["features"], serde_json::json!([]));
    }

    #[test]
    fn written_layer_parses_as_geojson() {
        let mut renderer = GeoJsonHeatLayer::new();
        renderer
            .render(
                &[point(1.29, 36.82, 1.0), point(-1.0, 35.5, 0.1)],
                &HeatLayerOptions::default(),
            )
            .unwrap();

        let mut out = Vec::new();
        renderer.write_to(&mut out).unwrap();
        let parsed: geojson::GeoJson = String::from_utf8(out).unwrap().parse().unwrap();
        let geojson::GeoJson::FeatureCollection(collection) = parsed else {
            panic!("expected a feature collection");
        };
        assert_eq!(collection.features.len(), 2);
    }
}
