//! Wire shapes of the `/journeys` response. Only the fields the normalizer reads are modelled.

use serde::Deserialize;

/// Body of `/journeys`.
#[derive(Debug, Default, Deserialize)]
pub struct JourneysResponse {
    /// Absent when the API answers with an `error` object instead.
    #[serde(default)]
    pub journeys: Option<Vec<RawJourney>>,
    /// Disruptions referenced by section links.
    #[serde(default)]
    pub disruptions: Vec<RawDisruption>,
    #[serde(default)]
    pub error: Option<RawError>,
}

/// Error object returned in place of journeys.
#[derive(Debug, Default, Deserialize)]
pub struct RawError {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// One candidate itinerary.
#[derive(Debug, Default, Deserialize)]
pub struct RawJourney {
    /// Worst disruption effect on the journey, empty when running normally.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sections: Vec<RawSection>,
    /// `best`, `rapid`, `comfort`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub co2_emission: Option<RawCo2>,
}

/// Emission estimate of a journey.
#[derive(Debug, Default, Deserialize)]
pub struct RawCo2 {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// One leg of a journey.
#[derive(Debug, Default, Deserialize)]
pub struct RawSection {
    /// `public_transport`, `street_network`, `transfer`, `waiting`, `crow_fly`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// `walking`, `bike`, ... on street network sections.
    #[serde(default)]
    pub mode: Option<String>,
    /// Real-time departure, `YYYYMMDDTHHMMSS`.
    #[serde(default)]
    pub departure_date_time: Option<String>,
    /// Scheduled departure, `YYYYMMDDTHHMMSS`.
    #[serde(default)]
    pub base_departure_date_time: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub display_informations: Option<DisplayInformations>,
    #[serde(default)]
    pub from: Option<RawPlace>,
    #[serde(default)]
    pub to: Option<RawPlace>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

/// Line and vehicle labels of a public transport leg.
#[derive(Debug, Default, Deserialize)]
pub struct DisplayInformations {
    #[serde(default)]
    pub headsign: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub commercial_mode: Option<String>,
    #[serde(default)]
    pub physical_mode: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    /// Terminus of the vehicle.
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

/// Typed reference to another object of the response.
#[derive(Debug, Default, Deserialize)]
pub struct RawLink {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
}

/// Origin or destination of a leg.
#[derive(Debug, Default, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stop_point: Option<RawStopPoint>,
}

#[derive(Debug, Default, Deserialize)]
/// Reference to a stop point.
pub struct RawStopPoint {
    #[serde(default)]
    pub id: Option<String>,
}

/// Service disruption, shared by every leg that links to it.
#[derive(Debug, Default, Deserialize)]
pub struct RawDisruption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub severity: Option<RawSeverity>,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub impacted_objects: Vec<RawImpactedObject>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSeverity {
    /// Same vocabulary as the journey status, e.g. `SIGNIFICANT_DELAYS`.
    #[serde(default)]
    pub effect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
/// Object affected by a disruption.
pub struct RawImpactedObject {
    #[serde(default)]
    pub impacted_stops: Vec<RawImpactedStop>,
}

/// Stop time changed by a disruption.
#[derive(Debug, Default, Deserialize)]
pub struct RawImpactedStop {
    /// `HHMMSS`.
    #[serde(default)]
    pub base_departure_time: Option<String>,
    /// `HHMMSS`.
    #[serde(default)]
    pub amended_departure_time: Option<String>,
    #[serde(default)]
    pub stop_point: Option<RawStopPoint>,
}

impl RawSection {
    /// Walking legs, transfers and waits become a single filler row.
    pub fn is_walking(&self) -> bool {
        self.mode.as_deref() == Some("walking")
            || matches!(self.kind.as_deref(), Some("transfer" | "waiting"))
    }

    /// Identifier of the stop point the leg departs from.
    pub fn departure_stop(&self) -> Option<&str> {
        let from = self.from.as_ref()?;
        from.stop_point
            .as_ref()
            .and_then(|stop| stop.id.as_deref())
            .or(from.id.as_deref())
    }

    /// Links of the given type, whether attached to the section or its display block.
    pub fn links_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let display_links = self
            .display_informations
            .iter()
            .flat_map(|display| display.links.iter());
        self.links
            .iter()
            .chain(display_links)
            .filter(move |link| link.kind == kind)
            .map(|link| link.id.as_str())
    }
}

impl JourneysResponse {
    /// Disruption referenced by `id`.
    pub fn disruption(&self, id: &str) -> Option<&RawDisruption> {
        self.disruptions.iter().find(|disruption| disruption.id == id)
    }
}

impl RawDisruption {
    /// Impacted stop matching `stop_id`. Without a stop id, the first stop carrying
    /// an amended time.
    pub fn impacted_stop(&self, stop_id: Option<&str>) -> Option<&RawImpactedStop> {
        let mut stops = self
            .impacted_objects
            .iter()
            .flat_map(|object| object.impacted_stops.iter());

        match stop_id {
            Some(wanted) => stops.find(|stop| {
                stop.stop_point
                    .as_ref()
                    .and_then(|point| point.id.as_deref())
                    == Some(wanted)
            }),
            None => stops.find(|stop| stop.amended_departure_time.is_some()),
        }
    }
}
