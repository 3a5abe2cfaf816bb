//! Flattening of `/journeys` responses into timetable rows.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use quai_core::config::DEFAULT_DATE_FORMAT;
use quai_core::model::{PhysicalMode, TransportKind, TransportRecord};
use quai_core::ports::PortError;
use tracing::warn;

use crate::classify::{SectionView, classify};
use crate::raw::{JourneysResponse, RawJourney, RawSection};

/// Timestamp layout used by the API.
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Turns raw responses into [`TransportRecord`]s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_format: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl Normalizer {
    /// Normalizer rendering departures with the `strftime` pattern `date_format`.
    #[must_use]
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// Rows for the first `max_count` journeys, in response order.
    ///
    /// Each journey contributes at most one waiting row, at the position of its
    /// first walking leg. Legs without a readable departure are logged and skipped.
    #[must_use]
    pub fn normalize(&self, response: &JourneysResponse, max_count: usize) -> Vec<TransportRecord> {
        let journeys = response.journeys.as_deref().unwrap_or_default();
        let mut records = Vec::new();

        for (index, journey) in journeys.iter().take(max_count).enumerate() {
            let mut waiting_emitted = false;

            for section in &journey.sections {
                if section.is_walking() {
                    if !waiting_emitted {
                        records.push(TransportRecord::waiting());
                        waiting_emitted = true;
                    }
                    continue;
                }

                match self.transit_record(response, journey, section) {
                    Ok(record) => records.push(record),
                    Err(err) => warn!(journey = index, error = %err, "skipping section"),
                }
            }
        }

        records
    }

    fn transit_record(
        &self,
        response: &JourneysResponse,
        journey: &RawJourney,
        section: &RawSection,
    ) -> Result<TransportRecord, PortError> {
        let raw_departure = section.departure_date_time.as_deref().ok_or_else(|| {
            PortError::MalformedSection("missing departure_date_time".to_owned())
        })?;
        let departure = parse_stamp(raw_departure).ok_or_else(|| {
            PortError::MalformedSection(format!("unreadable departure_date_time {raw_departure:?}"))
        })?;
        let base_departure = section
            .base_departure_date_time
            .as_deref()
            .and_then(parse_stamp);

        let disruption = section
            .links_of("disruption")
            .find_map(|id| response.disruption(id));

        let classification = classify(
            &SectionView {
                departure,
                base_departure,
                disruption,
                departure_stop: section.departure_stop(),
            },
            journey.status.as_deref(),
        );

        let display = section.display_informations.as_ref();
        let text = |value: Option<&String>| value.cloned().unwrap_or_default();

        let physical_mode = section
            .links_of("physical_mode")
            .next()
            .or_else(|| display.and_then(|display| display.physical_mode.as_deref()))
            .map_or(PhysicalMode::Other, PhysicalMode::from_source);

        let destination = display
            .and_then(|display| display.direction.as_deref())
            .or_else(|| section.to.as_ref().and_then(|place| place.name.as_deref()))
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_owned);

        let date = self.format_date(departure);
        // A pattern coarser than minutes can render both times identically.
        let (original_date, delay) = match (classification.delay_minutes, base_departure) {
            (Some(minutes), Some(base)) => {
                let original = self.format_date(base);
                if original == date {
                    (None, None)
                } else {
                    (Some(original), Some(minutes))
                }
            }
            _ => (None, None),
        };

        Ok(TransportRecord {
            kind: TransportKind::Transit,
            physical_mode: Some(physical_mode),
            network: text(display.and_then(|display| display.network.as_ref())),
            commercial_mode: text(display.and_then(|display| display.commercial_mode.as_ref())),
            headsign: text(display.and_then(|display| display.headsign.as_ref())),
            code: text(display.and_then(|display| display.code.as_ref())),
            date: Some(date),
            original_date,
            delay,
            duration: section.duration.filter(|secs| *secs > 0).map(format_duration),
            destination,
            state: classification.state,
            disruption_info: classification.disruption_info,
            journey_type: journey
                .kind
                .as_deref()
                .filter(|kind| !kind.is_empty())
                .map(str::to_owned),
            co2: format_co2(journey),
        })
    }

    fn format_date(&self, stamp: NaiveDateTime) -> String {
        let mut out = String::new();
        if write!(out, "{}", stamp.format(&self.date_format)).is_err() {
            out = stamp.format(DEFAULT_DATE_FORMAT).to_string();
        }
        out
    }
}

/// Parse an API timestamp. Some payloads prefix it with a label, so only the
/// last whitespace-separated token is read.
fn parse_stamp(raw: &str) -> Option<NaiveDateTime> {
    let token = raw.split_whitespace().last()?;
    NaiveDateTime::parse_from_str(token, STAMP_FORMAT).ok()
}

/// `25 min`, `1h05`.
fn format_duration(secs: i64) -> String {
    let minutes = (secs + 30) / 60;
    if minutes >= 60 {
        format!("{}h{:02}", minutes / 60, minutes % 60)
    } else {
        format!("{} min", minutes.max(1))
    }
}

fn format_co2(journey: &RawJourney) -> Option<String> {
    let emission = journey.co2_emission.as_ref()?;
    let value = emission.value?;
    let unit = emission.unit.as_deref().unwrap_or("gEC");
    Some(format!("{value:.0} {unit}"))
}
