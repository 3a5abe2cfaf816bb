//! Traits describing journey provider capabilities and the shared error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{JourneyQuery, TransportRecord};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Connection failure or timeout.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The provider answered with a non-success HTTP status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The response is not a journeys document.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// A single leg could not be read; the rest of the batch is kept.
    #[error("Malformed section: {0}")]
    MalformedSection(String),
    /// Board configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
/// Trait for provider-specific journey search backends.
pub trait JourneyPort: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Search journeys and normalize them into timetable rows.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails, the provider rejects it,
    /// or the response cannot be read as a whole.
    async fn journeys(&self, query: &JourneyQuery) -> Result<Vec<TransportRecord>, PortError>;
}
