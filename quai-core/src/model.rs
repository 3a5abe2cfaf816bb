//! Domain data structures for stations, journey queries, and normalized transport records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a stop area as understood by the journey API,
/// e.g. `stop_area:SNCF:87391003`.
pub struct StationCode(pub String);

impl fmt::Display for StationCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Clone)]
/// Parameters of a single journey search. Built fresh for every poll cycle.
pub struct JourneyQuery {
    /// Origin stop area.
    pub from: StationCode,
    /// Destination stop area.
    pub to: StationCode,
    /// Requested departure date and time.
    pub datetime: NaiveDateTime,
    /// Maximum number of journeys to keep.
    pub count: usize,
    /// Credential sent verbatim in the `Authorization` header.
    pub api_key: String,
}

impl fmt::Debug for JourneyQuery {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JourneyQuery")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("datetime", &self.datetime)
            .field("count", &self.count)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kind of row produced for a journey leg.
pub enum TransportKind {
    /// Walking transfer, rendered as "in transit / waiting" filler.
    Waiting,
    /// Ride on a vehicle.
    Transit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Vehicle category used to pick display iconography.
pub enum PhysicalMode {
    /// Plane.
    Air,
    /// Ferry or boat.
    Boat,
    /// Bus, coach, shuttle and bus rapid transit.
    Bus,
    /// Underground metro.
    Metro,
    /// Suburban commuter rail such as RER or Transilien.
    CommuterRail,
    /// Regional, long distance and rapid transit trains.
    Train,
    /// Tramway.
    Tramway,
    /// Suspended cable car or funicular.
    Cable,
    /// Taxi or on-demand service.
    Taxi,
    /// Anything the mapping table does not know.
    Other,
}

/// Source labels and identifiers mapped to their category, compared case-insensitively.
const PHYSICAL_MODES: &[(&str, PhysicalMode)] = &[
    ("air", PhysicalMode::Air),
    ("ferry", PhysicalMode::Boat),
    ("boat", PhysicalMode::Boat),
    ("bus", PhysicalMode::Bus),
    ("busrapidtransit", PhysicalMode::Bus),
    ("coach", PhysicalMode::Bus),
    ("autocar", PhysicalMode::Bus),
    ("shuttle", PhysicalMode::Bus),
    ("metro", PhysicalMode::Metro),
    ("métro", PhysicalMode::Metro),
    ("train de banlieue / rer", PhysicalMode::CommuterRail),
    ("rer / transilien", PhysicalMode::CommuterRail),
    ("rer", PhysicalMode::CommuterRail),
    ("localtrain", PhysicalMode::Train),
    ("longdistancetrain", PhysicalMode::Train),
    ("train", PhysicalMode::Train),
    ("train grande vitesse", PhysicalMode::Train),
    ("ter / intercités", PhysicalMode::Train),
    ("railshuttle", PhysicalMode::Train),
    ("rapidtransit", PhysicalMode::Train),
    ("tramway", PhysicalMode::Tramway),
    ("suspendedcablecar", PhysicalMode::Cable),
    ("funicular", PhysicalMode::Cable),
    ("taxi", PhysicalMode::Taxi),
];

impl PhysicalMode {
    /// Map a source physical mode, either its display name (`"Train de banlieue / RER"`)
    /// or its identifier (`"physical_mode:LocalTrain"`), to a category.
    #[must_use]
    pub fn from_source(raw: &str) -> Self {
        let trimmed = raw.trim();
        let key = trimmed
            .strip_prefix("physical_mode:")
            .unwrap_or(trimmed)
            .to_lowercase();

        PHYSICAL_MODES
            .iter()
            .find(|(label, _)| *label == key)
            .map_or(Self::Other, |(_, mode)| *mode)
    }

    /// Whether a row for this mode is best identified by its line code rather than
    /// its headsign.
    #[must_use]
    pub fn shows_line_code(self) -> bool {
        matches!(self, Self::Bus | Self::CommuterRail | Self::Cable | Self::Other)
    }

    /// Glyph shown next to the line name.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Air => "✈",
            Self::Boat => "⛴",
            Self::Bus => "🚌",
            Self::Metro => "🚇",
            Self::CommuterRail | Self::Train | Self::Tramway => "🚆",
            Self::Taxi => "🚕",
            Self::Cable | Self::Other => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Service status of a transit leg.
pub enum TransportState {
    /// Running as planned.
    OnTime,
    /// Running late.
    SignificantDelays,
    /// Cancelled.
    NoService,
    /// Running with fewer stops or vehicles.
    ReducedService,
    /// Route or timing changed.
    ModifiedService,
    /// Extra, unplanned service.
    AdditionalService,
    /// Disrupted with an unknown effect.
    UnknownEffect,
    /// Diverted.
    Detour,
    /// Disrupted in some other way.
    OtherEffect,
}

const STATES: &[(&str, TransportState)] = &[
    ("ON_TIME", TransportState::OnTime),
    ("SIGNIFICANT_DELAYS", TransportState::SignificantDelays),
    ("NO_SERVICE", TransportState::NoService),
    ("REDUCED_SERVICE", TransportState::ReducedService),
    ("MODIFIED_SERVICE", TransportState::ModifiedService),
    ("ADDITIONAL_SERVICE", TransportState::AdditionalService),
    ("UNKNOWN_EFFECT", TransportState::UnknownEffect),
    ("DETOUR", TransportState::Detour),
    ("OTHER_EFFECT", TransportState::OtherEffect),
];

impl TransportState {
    /// Parse a source status string, ignoring case. Unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        STATES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(raw))
            .map(|(_, state)| *state)
    }

    /// Wire name of the state, e.g. `NO_SERVICE`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        STATES
            .iter()
            .find(|(_, state)| *state == self)
            .map_or("OTHER_EFFECT", |(name, _)| name)
    }

    /// Short human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OnTime => "On time",
            Self::SignificantDelays => "Delayed",
            Self::NoService => "Cancelled",
            Self::ReducedService => "Reduced service",
            Self::ModifiedService => "Modified service",
            Self::AdditionalService => "Additional service",
            Self::UnknownEffect => "Disrupted",
            Self::Detour => "Detour",
            Self::OtherEffect => "Disrupted",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Disruption details attached to a transit leg.
pub struct DisruptionInfo {
    /// Cause given by the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// New departure time at the boarding stop, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amended_departure_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Normalized, renderer-agnostic row of the timetable.
pub struct TransportRecord {
    /// Waiting filler or transit leg.
    #[serde(rename = "type")]
    pub kind: TransportKind,
    /// Vehicle category; never set on waiting rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_mode: Option<PhysicalMode>,
    /// Operating network, e.g. `SNCF`.
    #[serde(default)]
    pub network: String,
    /// Commercial mode, e.g. `TER`.
    #[serde(default)]
    pub commercial_mode: String,
    /// Train number or vehicle headsign.
    #[serde(default)]
    pub headsign: String,
    /// Line code.
    #[serde(default)]
    pub code: String,
    /// Formatted departure time, amended when the source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Formatted base departure time, only present when delayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
    /// Deviation from the base departure in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    /// Formatted leg duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Final stop of the vehicle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Service status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TransportState>,
    /// Cause and amended time, when the source reported any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruption_info: Option<DisruptionInfo>,
    /// Journey classification such as `best` or `rapid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journey_type: Option<String>,
    /// CO2 emission of the owning journey.
    #[serde(rename = "c02", default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<String>,
}

impl TransportRecord {
    /// Filler row standing for a walking transfer.
    #[must_use]
    pub fn waiting() -> Self {
        Self {
            kind: TransportKind::Waiting,
            physical_mode: None,
            network: String::new(),
            commercial_mode: String::new(),
            headsign: String::new(),
            code: String::new(),
            date: None,
            original_date: None,
            delay: None,
            duration: None,
            destination: None,
            state: None,
            disruption_info: None,
            journey_type: None,
            co2: None,
        }
    }

    /// Whether this row is walking filler.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.kind == TransportKind::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_mode_accepts_names_and_ids() {
        assert_eq!(
            PhysicalMode::from_source("physical_mode:LongDistanceTrain"),
            PhysicalMode::Train
        );
        assert_eq!(
            PhysicalMode::from_source("Train de banlieue / RER"),
            PhysicalMode::CommuterRail
        );
        assert_eq!(PhysicalMode::from_source(" Ferry "), PhysicalMode::Boat);
        assert_eq!(PhysicalMode::from_source("Coach"), PhysicalMode::Bus);
        assert_eq!(PhysicalMode::from_source("hovercraft"), PhysicalMode::Other);
    }

    #[test]
    fn bus_rows_show_line_code() {
        assert!(PhysicalMode::Bus.shows_line_code());
        assert!(!PhysicalMode::Train.shows_line_code());
    }

    #[test]
    fn state_parse_is_case_insensitive() {
        assert_eq!(
            TransportState::parse("no_service"),
            Some(TransportState::NoService)
        );
        assert_eq!(
            TransportState::parse("SIGNIFICANT_DELAYS"),
            Some(TransportState::SignificantDelays)
        );
        assert_eq!(TransportState::parse("SOMETHING_ELSE"), None);
        assert_eq!(TransportState::Detour.to_string(), "DETOUR");
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let mut record = TransportRecord::waiting();
        record.kind = TransportKind::Transit;
        record.physical_mode = Some(PhysicalMode::Train);
        record.state = Some(TransportState::OnTime);
        record.co2 = Some("12 gEC".to_owned());
        record.disruption_info = Some(DisruptionInfo {
            cause: None,
            amended_departure_time: Some("08:15".to_owned()),
        });

        let json = serde_json::to_value(&record).expect("serializable record");
        assert_eq!(json["type"], "transit");
        assert_eq!(json["physicalMode"], "Train");
        assert_eq!(json["state"], "ON_TIME");
        assert_eq!(json["c02"], "12 gEC");
        assert_eq!(json["disruptionInfo"]["amendedDepartureTime"], "08:15");
        assert!(json.get("delay").is_none());
        assert!(json["disruptionInfo"].get("cause").is_none());
    }

    #[test]
    fn query_debug_hides_credential() {
        let query = JourneyQuery {
            from: StationCode("stop_area:A".into()),
            to: StationCode("stop_area:B".into()),
            datetime: NaiveDateTime::default(),
            count: 3,
            api_key: "secret-token".into(),
        };
        assert!(!format!("{query:?}").contains("secret-token"));
    }
}
