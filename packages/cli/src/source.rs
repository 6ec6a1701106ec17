//! Offline observation source backed by a JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use wildlife_map_client::{ClientError, ObservationSource};
use wildlife_map_sighting_models::RawObservation;

/// Reads observations from a JSON array on disk, in the same shape the
/// provider's `/animals/` endpoint returns.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ObservationSource for FileSource {
    async fn observations(&self) -> Result<Vec<RawObservation>, ClientError> {
        let unavailable = |reason: String| ClientError::DataSourceUnavailable {
            url: self.path.display().to_string(),
            reason,
        };

        log::debug!("Reading observations from {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| unavailable(format!("undecodable observations: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use wildlife_map_client::{RefreshOutcome, refresh_heatmap};
    use wildlife_map_heatmap::models::VisibilityMask;

    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wildlife_map_{name}_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_provider_shaped_json() {
        let path = temp_file(
            "sightings",
            r#"[
                {"id": 1, "species": "Lion", "count": 2, "latitude": "1.29001", "longitude": "36.82001"},
                {"id": 2, "species": "Elephant", "count": 20, "latitude": "-1.5", "longitude": "35.1"}
            ]"#,
        );

        let outcome = refresh_heatmap(&FileSource::new(path.clone()), &VisibilityMask::new()).await;
        std::fs::remove_file(path).unwrap();

        let RefreshOutcome::Loaded(aggregation) = outcome else {
            panic!("expected Loaded");
        };
        assert_eq!(aggregation.points.len(), 2);
        assert_eq!(aggregation.max_count, 20);
    }

    #[tokio::test]
    async fn missing_file_is_a_failed_refresh() {
        let source = FileSource::new(PathBuf::from("/nonexistent/sightings.json"));
        assert!(matches!(
            refresh_heatmap(&source, &VisibilityMask::new()).await,
            RefreshOutcome::Failed(ClientError::DataSourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn non_array_body_is_a_failed_refresh() {
        let path = temp_file("not_array", r#"{"detail": "Not found."}"#);
        let outcome = refresh_heatmap(&FileSource::new(path.clone()), &VisibilityMask::new()).await;
        std::fs::remove_file(path).unwrap();

        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    }
}
