//! Board configuration, delivered once by the host before polling starts.

use std::time::Duration;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::model::{JourneyQuery, StationCode};
use crate::ports::PortError;
use crate::scheduler::PollTiming;

/// Default departure format, e.g. `Mon, Jan 1, 2024 8:15 AM`.
pub const DEFAULT_DATE_FORMAT: &str = "%a, %b %-d, %Y %-I:%M %p";

/// Legacy format name accepted for [`DEFAULT_DATE_FORMAT`].
const LEGACY_DATE_FORMAT: &str = "llll";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u8")]
/// Kind of search the board performs.
pub enum SearchMode {
    /// Door-to-door journey search (`0`).
    #[default]
    Journeys,
    /// Departure board (`1`); duration, status, type and CO2 are not meaningful.
    Departures,
}

impl TryFrom<u8> for SearchMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Journeys),
            1 => Ok(Self::Departures),
            other => Err(format!("unknown mode {other}, expected 0 or 1")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// All options of a board instance.
pub struct BoardConfig {
    /// Instance identifier echoed in every [`crate::TrainsEvent`].
    pub id: String,
    /// Origin stop area.
    #[serde(rename = "departureStationUIC", alias = "departUIC")]
    pub departure_station: Option<StationCode>,
    /// Destination stop area.
    #[serde(rename = "arrivalStationUIC", alias = "arriveeUIC")]
    pub arrival_station: Option<StationCode>,
    /// API credential.
    #[serde(alias = "login")]
    pub api_key: Option<String>,
    /// Steady-state delay between fetches, in milliseconds.
    #[serde(rename = "updateInterval")]
    pub update_interval_ms: u64,
    /// Delay before retrying while nothing has been loaded yet, in milliseconds.
    #[serde(rename = "retryDelay")]
    pub retry_delay_ms: u64,
    /// Delay before the first fetch, in milliseconds.
    #[serde(rename = "initialLoadDelay")]
    pub initial_load_delay_ms: u64,
    /// Maximum number of journeys shown.
    #[serde(alias = "trainsdisplayed")]
    pub number_days: usize,
    /// Maximum number of transfers per journey.
    pub max_nb_transfers: u32,
    /// Journey or departure search.
    pub mode: SearchMode,
    /// `strftime` pattern for departure times.
    pub date_format: String,
    /// Verbose logging.
    pub debugging: bool,
    /// Show the leg duration column.
    pub display_duration: bool,
    /// Show the line name column.
    pub display_name: bool,
    /// Show the destination column.
    pub display_destination: bool,
    /// Show the journey type column.
    pub display_type: bool,
    /// Show the CO2 column.
    #[serde(rename = "displayC02")]
    pub display_co2: bool,
    /// Show the status column.
    pub display_peculiarities: bool,
    /// Show column headers.
    pub display_headers: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            id: String::from("quai"),
            departure_station: None,
            arrival_station: None,
            api_key: None,
            update_interval_ms: 60_000,
            retry_delay_ms: 10_000,
            initial_load_delay_ms: 0,
            number_days: 1,
            max_nb_transfers: 10,
            mode: SearchMode::Journeys,
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            debugging: false,
            display_duration: true,
            display_name: true,
            display_destination: false,
            display_type: false,
            display_co2: false,
            display_peculiarities: true,
            display_headers: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Columns the presenter should render, after the search mode has been applied.
pub struct DisplayHints {
    /// Line name column.
    pub name: bool,
    /// Duration column.
    pub duration: bool,
    /// Destination column.
    pub destination: bool,
    /// Status column.
    pub peculiarities: bool,
    /// Journey type column.
    pub journey_type: bool,
    /// CO2 column.
    pub co2: bool,
    /// Header row.
    pub headers: bool,
}

impl BoardConfig {
    /// Parse a configuration from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidConfig`] when the document does not parse.
    pub fn from_json(raw: &str) -> Result<Self, PortError> {
        serde_json::from_str(raw).map_err(|err| PortError::InvalidConfig(err.to_string()))
    }

    /// Check that the configuration can drive a poll loop.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidConfig`] naming the first offending option.
    pub fn validate(&self) -> Result<(), PortError> {
        let invalid = |msg: &str| Err(PortError::InvalidConfig(msg.to_owned()));

        if self.departure_station.as_ref().is_none_or(|code| code.0.trim().is_empty()) {
            return invalid("departureStationUIC is required");
        }
        if self.arrival_station.as_ref().is_none_or(|code| code.0.trim().is_empty()) {
            return invalid("arrivalStationUIC is required");
        }
        if self.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return invalid("apiKey is required");
        }
        if self.update_interval_ms == 0 {
            return invalid("updateInterval must be positive");
        }
        if self.number_days == 0 {
            return invalid("numberDays must be positive");
        }
        if StrftimeItems::new(self.date_pattern()).any(|item| matches!(item, Item::Error)) {
            return invalid("dateFormat is not a valid strftime pattern");
        }
        Ok(())
    }

    /// Build the query for a poll cycle starting at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidConfig`] when stations or credential are missing.
    pub fn query_at(&self, now: NaiveDateTime) -> Result<JourneyQuery, PortError> {
        let missing = |field: &str| PortError::InvalidConfig(format!("{field} is required"));

        Ok(JourneyQuery {
            from: self
                .departure_station
                .clone()
                .ok_or_else(|| missing("departureStationUIC"))?,
            to: self
                .arrival_station
                .clone()
                .ok_or_else(|| missing("arrivalStationUIC"))?,
            datetime: now,
            count: self.number_days,
            api_key: self.api_key.clone().ok_or_else(|| missing("apiKey"))?,
        })
    }

    /// Timing of the poll loop.
    #[must_use]
    pub fn timing(&self) -> PollTiming {
        PollTiming {
            initial_delay: Duration::from_millis(self.initial_load_delay_ms),
            update_interval: Duration::from_millis(self.update_interval_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// `strftime` pattern for departure times.
    #[must_use]
    pub fn date_pattern(&self) -> &str {
        if self.date_format == LEGACY_DATE_FORMAT {
            DEFAULT_DATE_FORMAT
        } else {
            &self.date_format
        }
    }

    /// Display toggles with the search mode applied.
    #[must_use]
    pub fn display_hints(&self) -> DisplayHints {
        let hints = DisplayHints {
            name: self.display_name,
            duration: self.display_duration,
            destination: self.display_destination,
            peculiarities: self.display_peculiarities,
            journey_type: self.display_type,
            co2: self.display_co2,
            headers: self.display_headers,
        };

        match self.mode {
            SearchMode::Departures => DisplayHints {
                duration: false,
                peculiarities: false,
                journey_type: false,
                co2: false,
                ..hints
            },
            SearchMode::Journeys => DisplayHints {
                peculiarities: true,
                ..hints
            },
        }
    }
}
