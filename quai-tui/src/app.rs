use quai_core::{BoardConfig, DisplayHints, Timetable, TrainsEvent};
use tokio::sync::mpsc;
use tracing::debug;

pub(crate) struct App {
    pub timetable: Timetable,
    pub hints: DisplayHints,
    pub route: String,
    pub scroll: usize,

    events: mpsc::Receiver<TrainsEvent>,
}

impl App {
    pub(crate) fn new(config: &BoardConfig, events: mpsc::Receiver<TrainsEvent>) -> Self {
        let station = |code: Option<&quai_core::StationCode>| {
            code.map_or_else(|| "?".to_owned(), ToString::to_string)
        };

        Self {
            timetable: Timetable::new(config.id.clone()),
            hints: config.display_hints(),
            route: format!(
                "{} → {}",
                station(config.departure_station.as_ref()),
                station(config.arrival_station.as_ref())
            ),
            scroll: 0,
            events,
        }
    }

    /// Install every pending fetch result; the last one wins.
    pub(crate) fn receive_updates(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            let id = event.id.clone();
            if !self.timetable.apply(event) {
                debug!(%id, "ignoring records for another board");
            }
        }

        let last = self.timetable.transports().len().saturating_sub(1);
        self.scroll = self.scroll.min(last);
    }

    pub(crate) fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub(crate) fn scroll_down(&mut self) {
        if self.scroll + 1 < self.timetable.transports().len() {
            self.scroll += 1;
        }
    }
}
