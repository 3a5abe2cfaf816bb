use quai_core::model::{TransportRecord, TransportState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use crate::app::App;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, timetable, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(app.route.as_str())
        .block(Block::default().borders(Borders::ALL).title("Quai"));
    frame.render_widget(header, *header_area);

    draw_timetable(frame, app, *content_area);

    let nav_hint = "↑/↓ scroll · g top · q/Esc/Ctrl-C quit";
    let status_text = match app.timetable.updated_at() {
        Some(at) => format!("Updated {} · {nav_hint}", at.format("%H:%M:%S")),
        None => format!("Waiting for the first update… · {nav_hint}"),
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, *status_area);
}

fn draw_timetable(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Next departures";

    if !app.timetable.is_loaded() {
        let paragraph = Paragraph::new("Loading…")
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(paragraph, area);
        return;
    }

    if app.timetable.transports().is_empty() {
        let paragraph = Paragraph::new("No route found.")
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let hints = app.hints;
    let mut headers = Vec::new();
    let mut widths = Vec::new();
    let mut push_column = |enabled: bool, name: &'static str, width: Constraint| {
        if enabled {
            headers.push(name);
            widths.push(width);
        }
    };
    push_column(hints.name, "Line", Constraint::Min(24));
    push_column(true, "Departure", Constraint::Length(36));
    push_column(hints.duration, "Duration", Constraint::Length(9));
    push_column(hints.destination, "Destination", Constraint::Min(16));
    push_column(hints.peculiarities, "Status", Constraint::Min(18));
    push_column(hints.journey_type, "Type", Constraint::Length(10));
    push_column(hints.co2, "CO2", Constraint::Length(10));

    let rows = app
        .timetable
        .transports()
        .iter()
        .skip(app.scroll)
        .map(|record| {
            let mut cells = Vec::new();
            if hints.name {
                cells.push(Cell::from(line_label(record)));
            }
            cells.push(Cell::from(departure_line(record)));
            if hints.duration {
                cells.push(Cell::from(record.duration.clone().unwrap_or_default()));
            }
            if hints.destination {
                cells.push(Cell::from(record.destination.clone().unwrap_or_default()));
            }
            if hints.peculiarities {
                cells.push(Cell::from(status_line(record)));
            }
            if hints.journey_type {
                cells.push(Cell::from(record.journey_type.clone().unwrap_or_default()));
            }
            if hints.co2 {
                cells.push(Cell::from(record.co2.clone().unwrap_or_default()));
            }
            Row::new(cells)
        });

    let mut table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    if hints.headers {
        table = table.header(Row::new(headers).style(Style::default().add_modifier(Modifier::BOLD)));
    }

    frame.render_widget(table, area);
}

fn line_label(record: &TransportRecord) -> String {
    if record.is_waiting() {
        return "🚶".to_owned();
    }

    let Some(mode) = record.physical_mode else {
        return format!("{} {}", record.network, record.headsign);
    };
    let ident = if mode.shows_line_code() && !record.code.is_empty() {
        &record.code
    } else {
        &record.headsign
    };
    format!(
        "{} {} {} {ident}",
        mode.icon(),
        record.network,
        record.commercial_mode
    )
    .trim()
    .to_owned()
}

fn departure_line(record: &TransportRecord) -> Line<'static> {
    let date = record.date.clone().unwrap_or_default();
    let (Some(_), Some(original)) = (record.delay, record.original_date.clone()) else {
        return Line::from(date);
    };

    let amended = record
        .disruption_info
        .as_ref()
        .and_then(|info| info.amended_departure_time.clone())
        .unwrap_or(date);

    Line::from(vec![
        Span::styled(original, Style::default().add_modifier(Modifier::CROSSED_OUT)),
        Span::raw(" "),
        Span::styled(amended, Style::default().fg(Color::Yellow)),
    ])
}

fn status_line(record: &TransportRecord) -> Line<'static> {
    if record.is_waiting() {
        return Line::styled("waiting", Style::default().add_modifier(Modifier::ITALIC));
    }

    let mut spans = match record.state {
        Some(TransportState::OnTime) => vec![Span::styled(
            TransportState::OnTime.label(),
            Style::default().fg(Color::Green),
        )],
        Some(TransportState::NoService) => vec![Span::styled(
            TransportState::NoService.label(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
        Some(TransportState::SignificantDelays) => {
            let text = match record.delay {
                Some(minutes) if minutes > 0 => {
                    format!("{} +{minutes} min", TransportState::SignificantDelays.label())
                }
                _ => TransportState::SignificantDelays.label().to_owned(),
            };
            vec![Span::styled(text, Style::default().fg(Color::Yellow))]
        }
        Some(state) => vec![Span::styled(
            state.label(),
            Style::default().fg(Color::Yellow),
        )],
        None => Vec::new(),
    };

    if let Some(cause) = record
        .disruption_info
        .as_ref()
        .and_then(|info| info.cause.clone())
    {
        if !spans.is_empty() {
            spans.push(Span::raw(" · "));
        }
        spans.push(Span::styled(cause, Style::default().add_modifier(Modifier::DIM)));
    }

    Line::from(spans)
}
