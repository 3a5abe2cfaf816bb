//! HTTP access to the SNCF `/journeys` endpoint.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use quai_core::model::JourneyQuery;
use quai_core::ports::PortError;

use crate::raw::JourneysResponse;

/// Production coverage of the SNCF API.
pub const BASE_URL: &str = "https://api.sncf.com/v1/coverage/sncf";

/// Request datetime layout, ISO-8601 basic format.
const QUERY_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Error id returned when no itinerary matches the query.
const NO_SOLUTION: &str = "no_solution";

/// Longest body excerpt kept in error messages.
const BODY_EXCERPT: usize = 500;

/// Thin client for the journeys endpoint. Every call is a fresh round-trip.
#[derive(Debug, Clone)]
pub struct SncfClient {
    client: Client,
    base_url: String,
}

impl SncfClient {
    /// Client targeting the production API.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_owned(),
        }
    }

    /// Target another coverage or a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Request for `query`, not yet sent.
    #[must_use]
    pub fn journeys_request(&self, query: &JourneyQuery) -> RequestBuilder {
        let datetime = query.datetime.format(QUERY_DATETIME_FORMAT).to_string();
        let count = query.count.to_string();

        self.client
            .get(format!("{}/journeys", self.base_url))
            .header(AUTHORIZATION, &query.api_key)
            .query(&[
                ("from", query.from.0.as_str()),
                ("to", query.to.0.as_str()),
                ("datetime", datetime.as_str()),
                ("count", count.as_str()),
            ])
    }

    /// Search journeys for `query`.
    ///
    /// A `no_solution` answer is an empty journey list rather than an error.
    ///
    /// # Errors
    ///
    /// [`PortError::Network`] on transport failure or timeout, [`PortError::Api`]
    /// on a non-success status, [`PortError::MalformedResponse`] when the body is
    /// not a journeys document.
    pub async fn fetch_journeys(&self, query: &JourneyQuery) -> Result<JourneysResponse, PortError> {
        debug!(from = %query.from, to = %query.to, count = query.count, "requesting journeys");

        let response = self.journeys_request(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        read_journeys(status, &body)
    }
}

fn read_journeys(status: StatusCode, body: &str) -> Result<JourneysResponse, PortError> {
    let parsed = serde_json::from_str::<JourneysResponse>(body);

    if let Ok(document) = &parsed
        && document.journeys.is_none()
        && document.error.as_ref().is_some_and(|error| error.id == NO_SOLUTION)
    {
        return Ok(JourneysResponse {
            journeys: Some(Vec::new()),
            ..JourneysResponse::default()
        });
    }

    if !status.is_success() {
        return Err(PortError::Api {
            status: status.as_u16(),
            body: excerpt(body),
        });
    }

    let document = parsed.map_err(|err| PortError::MalformedResponse(err.to_string()))?;
    if document.journeys.is_some() {
        return Ok(document);
    }

    Err(PortError::MalformedResponse(match document.error {
        Some(error) => format!("{}: {}", error.id, error.message),
        None => "no journeys in response".to_owned(),
    }))
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}
