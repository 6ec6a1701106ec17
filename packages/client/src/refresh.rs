//! One full fetch-aggregate cycle for the density map.

use async_trait::async_trait;
use wildlife_map_heatmap::models::{Aggregation, VisibilityMask};
use wildlife_map_sighting_models::RawObservation;

use crate::{ApiClient, ClientError};

/// Anything that can produce the full list of raw observations.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetches every observation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the observations cannot be obtained.
    async fn observations(&self) -> Result<Vec<RawObservation>, ClientError>;
}

#[async_trait]
impl ObservationSource for ApiClient {
    async fn observations(&self) -> Result<Vec<RawObservation>, ClientError> {
        self.fetch_all_observations().await
    }
}

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The fetch returned records and they were aggregated. The
    /// aggregation may still have no visible points if every species is
    /// masked off.
    Loaded(Aggregation),
    /// The fetch succeeded but returned no records.
    NoData,
    /// The fetch failed. Nothing should be drawn.
    Failed(ClientError),
}

/// Fetches all observations from `source` and aggregates them under
/// `mask`.
///
/// Each call starts from scratch; the result fully replaces whatever the
/// previous cycle produced.
pub async fn refresh_heatmap<S>(source: &S, mask: &VisibilityMask) -> RefreshOutcome
where
    S: ObservationSource + ?Sized,
{
    let records = match source.observations().await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Heat map refresh failed: {e}");
            return RefreshOutcome::Failed(e);
        }
    };

    if records.is_empty() {
        log::info!("Heat map refresh returned no observations");
        return RefreshOutcome::NoData;
    }

    let aggregation = wildlife_map_heatmap::aggregate(&records, mask);
    log::info!(
        "Heat map refreshed: {} records, {} points, {} skipped",
        records.len(),
        aggregation.points.len(),
        aggregation.skipped
    );

    RefreshOutcome::Loaded(aggregation)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct FakeSource {
        response: Result<serde_json::Value, String>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn ok(body: serde_json::Value) -> Self {
            Self {
                response: Ok(body),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                response: Err(reason.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ObservationSource for FakeSource {
        async fn observations(&self) -> Result<Vec<RawObservation>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => Ok(serde_json::from_value(body.clone()).unwrap()),
                Err(reason) => Err(ClientError::DataSourceUnavailable {
                    url: "http://fake/animals/".to_string(),
                    reason: reason.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn loaded_outcome_carries_aggregation() {
        let source = FakeSource::ok(json!([
            { "species": "Lion", "latitude": "1.29001", "longitude": "36.82001", "count": 2 },
            { "species": "Lion", "latitude": "1.28999", "longitude": "36.81999", "count": 3 },
            { "species": "Lion", "latitude": "abc", "longitude": "36.8", "count": 9 },
        ]));

        let RefreshOutcome::Loaded(aggregation) =
            refresh_heatmap(&source, &VisibilityMask::new()).await
        else {
            panic!("expected Loaded");
        };
        assert_eq!(aggregation.points.len(), 1);
        assert_eq!(aggregation.points[0].total_count, 5);
        assert_eq!(aggregation.skipped, 1);
    }

    #[tokio::test]
    async fn empty_fetch_is_no_data() {
        let source = FakeSource::ok(json!([]));
        assert!(matches!(
            refresh_heatmap(&source, &VisibilityMask::new()).await,
            RefreshOutcome::NoData
        ));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_an_empty_success() {
        let source = FakeSource::failing("connection refused");
        match refresh_heatmap(&source, &VisibilityMask::new()).await {
            RefreshOutcome::Failed(ClientError::DataSourceUnavailable { reason, .. }) => {
                assert_eq!(reason, "connection refused");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_refresh_fetches_again() {
        let source = FakeSource::ok(json!([
            { "species": "Lion", "latitude": 1.0, "longitude": 36.0, "count": 1 },
        ]));
        let mut mask = VisibilityMask::new();

        assert!(matches!(
            refresh_heatmap(&source, &mask).await,
            RefreshOutcome::Loaded(ref a) if a.points.len() == 1
        ));

        mask.hide("Lion");
        let RefreshOutcome::Loaded(masked) = refresh_heatmap(&source, &mask).await else {
            panic!("expected Loaded");
        };
        assert!(masked.is_empty());
        assert!(masked.species.contains("Lion"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
