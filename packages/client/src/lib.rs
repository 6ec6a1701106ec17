#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the wildlife sighting data provider.
//!
//! Every endpoint is a plain `GET` returning JSON. Transport failures,
//! non-success statuses, and undecodable bodies all surface as
//! [`ClientError::DataSourceUnavailable`] so callers can show an explicit
//! error state instead of an empty map.

pub mod refresh;

use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wildlife_map_query::NormalizedQuery;
use wildlife_map_sighting_models::{CameraRecord, RawObservation, YearLabel, YearlySummaryPoint};

pub use refresh::{ObservationSource, RefreshOutcome, refresh_heatmap};

/// Query for endpoints that take no parameters.
const NO_PARAMS: &[(&str, &str)] = &[];

/// Errors that can occur while talking to the data provider.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured base URL cannot be used.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A request could not be built for the configured base URL.
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest {
        /// The URL the request was built from.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The provider could not be reached, answered with a non-success
    /// status, or sent a body that does not decode.
    #[error("data source unavailable at {url}: {reason}")]
    DataSourceUnavailable {
        /// The request URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
}

/// Client for the sighting provider's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `base_url` does not parse
    /// or cannot be a base.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client that sends requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `base_url` does not parse
    /// or cannot be a base.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            client,
            base_url: url,
        })
    }

    /// The normalized base URL, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the filtered observation request for `query`.
    ///
    /// An empty query produces the bare `animals/` URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built.
    pub fn observations_request(
        &self,
        query: &NormalizedQuery,
    ) -> Result<reqwest::Request, ClientError> {
        self.get_request("animals/", query)
    }

    /// Builds the yearly summary request for `species` in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built.
    pub fn yearly_summary_request(
        &self,
        year: &YearLabel,
        species: &str,
    ) -> Result<reqwest::Request, ClientError> {
        let year = year.to_string();
        self.get_request(
            "animals/yearly-summary/",
            &[("year", year.as_str()), ("species", species)],
        )
    }

    /// Fetches observations matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_observations(
        &self,
        query: &NormalizedQuery,
    ) -> Result<Vec<RawObservation>, ClientError> {
        self.send_json(self.observations_request(query)?).await
    }

    /// Fetches every observation, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_all_observations(&self) -> Result<Vec<RawObservation>, ClientError> {
        self.fetch_observations(&NormalizedQuery::new()).await
    }

    /// Fetches the registered cameras.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_cameras(&self) -> Result<Vec<CameraRecord>, ClientError> {
        self.send_json(self.get_request("cameras/", NO_PARAMS)?).await
    }

    /// Fetches the list of species names.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_species(&self) -> Result<Vec<String>, ClientError> {
        self.send_json(self.get_request("animals/species/", NO_PARAMS)?).await
    }

    /// Fetches the list of years with observations.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_years(&self) -> Result<Vec<YearLabel>, ClientError> {
        self.send_json(self.get_request("animals/years/", NO_PARAMS)?).await
    }

    /// Fetches the yearly population summary for `species`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the request cannot be
    /// built, or [`ClientError::DataSourceUnavailable`] if it fails.
    pub async fn fetch_yearly_summary(
        &self,
        year: &YearLabel,
        species: &str,
    ) -> Result<Vec<YearlySummaryPoint>, ClientError> {
        self.send_json(self.yearly_summary_request(year, species)?).await
    }

    fn get_request<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<reqwest::Request, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidRequest {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        self.client
            .get(url.clone())
            .query(query)
            .build()
            .map_err(|e| ClientError::InvalidRequest {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, ClientError> {
        let url = request.url().clone();
        log::debug!("GET {url}");

        let unavailable = |reason: String| ClientError::DataSourceUnavailable {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| unavailable(format!("undecodable response body: {e}")))
    }
}
