//! Records-out event and the presenter's copy of the last successful fetch.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::model::TransportRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Emitted once per successful fetch.
pub struct TrainsEvent {
    /// Identifier of the configuration that produced the records.
    pub id: String,
    /// Complete replacement list of rows.
    pub transports: Vec<TransportRecord>,
}

#[derive(Debug, Clone)]
/// Last-known-good timetable held by a presenter.
///
/// The list is only ever replaced as a whole by [`Timetable::apply`]; failed
/// fetches never reach it, so stale rows stay visible until fresh ones arrive.
pub struct Timetable {
    id: String,
    transports: Vec<TransportRecord>,
    updated_at: Option<DateTime<Local>>,
}

impl Timetable {
    /// Empty timetable listening for events carrying `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transports: Vec::new(),
            updated_at: None,
        }
    }

    /// Install the rows of `event` if it belongs to this board.
    ///
    /// Returns `false` and leaves the timetable untouched for foreign events.
    pub fn apply(&mut self, event: TrainsEvent) -> bool {
        if event.id != self.id {
            return false;
        }
        self.transports = event.transports;
        self.updated_at = Some(Local::now());
        true
    }

    /// Current rows.
    #[must_use]
    pub fn transports(&self) -> &[TransportRecord] {
        &self.transports
    }

    /// Whether at least one fetch has been applied.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Time of the last applied fetch.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, rows: usize) -> TrainsEvent {
        TrainsEvent {
            id: id.to_owned(),
            transports: vec![TransportRecord::waiting(); rows],
        }
    }

    #[test]
    fn starts_unloaded() {
        let timetable = Timetable::new("board");
        assert!(!timetable.is_loaded());
        assert!(timetable.transports().is_empty());
    }

    #[test]
    fn apply_replaces_rows() {
        let mut timetable = Timetable::new("board");
        assert!(timetable.apply(event("board", 3)));
        assert_eq!(timetable.transports().len(), 3);

        assert!(timetable.apply(event("board", 1)));
        assert_eq!(timetable.transports().len(), 1);
        assert!(timetable.is_loaded());
    }

    #[test]
    fn foreign_events_are_ignored() {
        let mut timetable = Timetable::new("board");
        timetable.apply(event("board", 2));

        assert!(!timetable.apply(event("other", 0)));
        assert_eq!(timetable.transports().len(), 2);
    }

    #[test]
    fn empty_fetch_still_counts_as_loaded() {
        let mut timetable = Timetable::new("board");
        timetable.apply(event("board", 0));
        assert!(timetable.is_loaded());
        assert!(timetable.transports().is_empty());
    }
}
