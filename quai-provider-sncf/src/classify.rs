//! Delay, status and disruption cause of a single transit leg.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use quai_core::model::{DisruptionInfo, TransportState};

use crate::raw::RawDisruption;

/// What the classifier needs to know about a leg, already pulled out of the response.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    /// Departure including real-time amendments.
    pub departure: NaiveDateTime,
    /// Scheduled departure, if the source gave one.
    pub base_departure: Option<NaiveDateTime>,
    /// Disruption linked from the section.
    pub disruption: Option<&'a RawDisruption>,
    /// Stop point the leg departs from, used to find the amended stop time.
    pub departure_stop: Option<&'a str>,
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Status of the leg.
    pub state: Option<TransportState>,
    /// Whole minutes between scheduled and actual departure, unset when equal.
    pub delay_minutes: Option<i64>,
    /// Cause and amended time, when the source reported any.
    pub disruption_info: Option<DisruptionInfo>,
}

/// Classify a leg. A status on the linked disruption wins over the journey status.
#[must_use]
pub fn classify(section: &SectionView<'_>, journey_status: Option<&str>) -> Classification {
    let delay_minutes = delay_minutes(section.departure, section.base_departure);

    let status = section
        .disruption
        .and_then(|disruption| disruption.severity.as_ref())
        .and_then(|severity| severity.effect.as_deref())
        .map(str::trim)
        .filter(|effect| !effect.is_empty())
        .or_else(|| journey_status.map(str::trim).filter(|status| !status.is_empty()));

    let state = match status {
        Some(raw) => TransportState::parse(raw),
        None if delay_minutes.is_none() => Some(TransportState::OnTime),
        None => None,
    };

    Classification {
        state,
        delay_minutes,
        disruption_info: section
            .disruption
            .and_then(|disruption| disruption_info(disruption, section.departure_stop)),
    }
}

/// Minutes between `base` and `actual`, ignoring seconds.
#[must_use]
pub fn delay_minutes(actual: NaiveDateTime, base: Option<NaiveDateTime>) -> Option<i64> {
    let base = base?;
    let minutes = (truncate_to_minute(actual) - truncate_to_minute(base)).num_minutes();
    (minutes != 0).then_some(minutes)
}

fn truncate_to_minute(stamp: NaiveDateTime) -> NaiveDateTime {
    stamp
        .with_second(0)
        .and_then(|stamp| stamp.with_nanosecond(0))
        .unwrap_or(stamp)
}

fn disruption_info(
    disruption: &RawDisruption,
    departure_stop: Option<&str>,
) -> Option<DisruptionInfo> {
    let cause = disruption
        .cause
        .as_deref()
        .map(str::trim)
        .filter(|cause| !cause.is_empty())
        .map(str::to_owned);

    let amended_departure_time = disruption.impacted_stop(departure_stop).and_then(|stop| {
        let amended = stop.amended_departure_time.as_deref()?;
        if stop.base_departure_time.as_deref() == Some(amended) {
            return None;
        }
        Some(format_stop_time(amended))
    });

    if cause.is_none() && amended_departure_time.is_none() {
        return None;
    }

    Some(DisruptionInfo {
        cause,
        amended_departure_time,
    })
}

/// `HHMMSS` as `HH:MM`; unreadable values are passed through.
fn format_stop_time(raw: &str) -> String {
    NaiveTime::parse_from_str(raw, "%H%M%S")
        .map_or_else(|_| raw.to_owned(), |time| time.format("%H:%M").to_string())
}
