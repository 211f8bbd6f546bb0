//! TUI rendering functions

use super::app::{DetailPane, TuiApp};
use crate::inbox::{DetailView, NoticeKind, UNKNOWN};
use crate::stream::StreamStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &TuiApp, stream: StreamStatus) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Status bar
            Constraint::Min(5),    // List + detail
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_status_bar(frame, app, stream, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    draw_request_list(frame, app, panes[0]);
    draw_detail(frame, app, panes[1]);
    draw_footer(frame, app, chunks[2]);
    draw_notices(frame, app, chunks[1]);
}

fn draw_status_bar(frame: &mut Frame, app: &TuiApp, stream: StreamStatus, area: Rect) {
    let status_color = match stream {
        StreamStatus::Live => Color::Green,
        StreamStatus::Connecting | StreamStatus::Reconnecting => Color::Yellow,
        StreamStatus::Closed => Color::Red,
    };

    let max_url_len = (area.width as usize).saturating_sub(40);
    let lines = vec![Line::from(vec![
        Span::styled(
            " echoendpoint ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("v{}  ", app.version), Style::default().fg(Color::DarkGray)),
        Span::styled(truncate_str(&app.webhook_url, max_url_len), Style::default().fg(Color::Cyan)),
        Span::styled("  ● ", Style::default().fg(status_color)),
        Span::styled(
            stream.as_str(),
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {} requests", app.count), Style::default().fg(Color::White)),
    ])];

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_request_list(frame: &mut Frame, app: &TuiApp, area: Rect) {
    // Marker(2) + Time(9) + Method(7) + borders/padding(~6)
    let fixed_width = 2 + 9 + 7 + 6;
    let path_width = (area.width as usize).saturating_sub(fixed_width).max(10);

    let header = Row::new(vec!["", "Time", "Method", "Path"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|req| {
            let is_active = app.active.as_ref() == Some(&req.id);
            let marker = if is_active { "▶" } else { " " };
            let time = req
                .received_at
                .map(|ts| ts.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| UNKNOWN.to_string());

            let row = Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Cyan)),
                Cell::from(time),
                Cell::from(format!("{:>6}", truncate_str(req.display_method(), 6)))
                    .style(method_style(req.display_method())),
                Cell::from(truncate_str(req.display_path(), path_width)),
            ]);
            if is_active {
                row.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(" Requests ({}) ", app.count))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

    let mut state = TableState::default();
    if !app.rows.is_empty() {
        state.select(Some(app.highlighted));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_detail(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let block = Block::default()
        .title(" Detail ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let lines = match &app.detail {
        DetailPane::Empty => vec![Line::from(Span::styled(
            "Select a request to inspect it.",
            Style::default().fg(Color::DarkGray),
        ))],
        DetailPane::Loading => vec![Line::from(Span::styled(
            "Loading…",
            Style::default().fg(Color::Yellow),
        ))],
        DetailPane::Ready(view) => detail_lines(view, app.show_raw_body),
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn detail_lines(view: &DetailView, raw: bool) -> Vec<Line<'_>> {
    let heading = Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                view.method.clone(),
                method_style(&view.method).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(view.path.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(view.meta.clone(), Style::default().fg(Color::DarkGray))),
        Line::from(""),
        Line::from(Span::styled("Headers", heading)),
    ];
    lines.extend(view.headers.lines().map(Line::from));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Query", heading)));
    lines.extend(view.query.lines().map(Line::from));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(if raw { "Body (raw)" } else { "Body" }, heading),
        Span::styled(
            format!("  {}", view.size_caption),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    let body = if raw { &view.body_raw } else { &view.body_preview };
    lines.extend(body.lines().map(Line::from));
    lines
}

/// Notices stack in the bottom-right corner of the main area
fn draw_notices(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let width = 48.min(area.width);
    let mut bottom = area.y + area.height;

    for notice in app.notices.iter().rev() {
        if bottom < area.y + 3 {
            break;
        }
        let rect = Rect::new(area.x + area.width - width, bottom - 3, width, 3);
        bottom -= 3;

        let color = match notice.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Failure => Color::Red,
            NoticeKind::Info => Color::Cyan,
        };
        let text = Line::from(Span::raw(truncate_str(
            &notice.message,
            (width as usize).saturating_sub(2),
        )));
        let block = Block::default()
            .title(format!(" {} ", notice.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));

        frame.render_widget(Clear, rect);
        frame.render_widget(Paragraph::new(text).block(block), rect);
    }
}

/// Draw the footer with key hints
fn draw_footer(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let text = if app.confirm_clear {
        Line::from(vec![
            Span::styled(
                "Delete all captured requests? ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled("y", Style::default().fg(Color::Cyan)),
            Span::styled(" confirm  ", Style::default().fg(Color::DarkGray)),
            Span::styled("any key", Style::default().fg(Color::Cyan)),
            Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let hints = [
            ("↑/↓", "Navigate"),
            ("Enter", "Inspect"),
            ("Esc", "Close"),
            ("m", "More"),
            ("r", "Raw"),
            ("x", "Clear"),
            ("PgUp/PgDn", "Scroll"),
            ("q", "Quit"),
        ];
        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(*key, Style::default().fg(Color::Cyan)),
                        Span::styled(format!(" {}  ", label), Style::default().fg(Color::DarkGray)),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Get style for HTTP method
fn method_style(method: &str) -> Style {
    match method {
        "GET" => Style::default().fg(Color::Green),
        "POST" => Style::default().fg(Color::Yellow),
        "PUT" => Style::default().fg(Color::Blue),
        "PATCH" => Style::default().fg(Color::Magenta),
        "DELETE" => Style::default().fg(Color::Red),
        "HEAD" => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

/// Truncate on char boundaries, marking the cut with `...`
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_len).collect()
    }
}
