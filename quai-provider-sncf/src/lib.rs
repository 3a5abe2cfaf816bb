//! Provider implementation for the SNCF journey planning API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use quai_core::{
    model::{JourneyQuery, TransportRecord},
    ports::{JourneyPort, PortError},
};

/// Disruption classification of a single leg.
pub mod classify;
/// HTTP client for the journeys endpoint.
pub mod client;
/// Flattening of responses into timetable rows.
pub mod normalize;
/// Serde models of the journeys response.
mod raw;

pub use client::SncfClient;
pub use normalize::Normalizer;

/// Journey search backed by the SNCF API.
pub struct SncfJourneyPort {
    client: SncfClient,
    normalizer: Normalizer,
}

impl SncfJourneyPort {
    /// Create a port from an API client and a normalizer.
    #[must_use]
    pub fn new(client: SncfClient, normalizer: Normalizer) -> Self {
        Self { client, normalizer }
    }
}

#[async_trait]
impl JourneyPort for SncfJourneyPort {
    fn name(&self) -> &str {
        "sncf"
    }

    async fn journeys(&self, query: &JourneyQuery) -> Result<Vec<TransportRecord>, PortError> {
        let response = self.client.fetch_journeys(query).await?;
        let records = self.normalizer.normalize(&response, query.count);

        debug!(
            journeys = response.journeys.as_ref().map_or(0, Vec::len),
            rows = records.len(),
            "normalized journeys"
        );

        Ok(records)
    }
}

/// Build the journey port for the SNCF provider, formatting departures with `date_format`.
#[must_use]
pub fn port(client: Client, date_format: &str) -> Arc<dyn JourneyPort> {
    Arc::new(SncfJourneyPort::new(
        SncfClient::new(client),
        Normalizer::new(date_format),
    ))
}
