use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType,
    Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::state::{FormField, FormState, Mode, ViewState};
use crate::app::Dashboard;
use crate::charts::Timeline;
use crate::config::StatusPalette;
use crate::highlight::{build_highlight_regex, segments};
use crate::metrics::format_rate;
use crate::model::{format_date, Status};

pub fn draw_dashboard(
    frame: &mut Frame,
    view: &ViewState,
    dashboard: &Dashboard,
    palette: &StatusPalette,
    table_state: &mut TableState,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[1]);

    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(36),
            Constraint::Percentage(32),
            Constraint::Percentage(32),
        ])
        .split(columns[1]);

    frame.render_widget(metrics_header(view, dashboard), vertical[0]);
    draw_table(frame, columns[0], view, dashboard, palette, table_state);
    draw_status_chart(frame, charts[0], dashboard, palette);
    draw_timeline(frame, charts[1], &dashboard.timeline);
    draw_company_chart(frame, charts[2], dashboard);
    frame.render_widget(footer(view), vertical[2]);

    match &view.mode {
        Mode::Form(form) => draw_form(frame, form),
        Mode::StatusPicker { cursor, pending } => {
            draw_status_picker(frame, *cursor, pending, palette)
        }
        Mode::ConfirmDelete { label, .. } => draw_confirm_delete(frame, label),
        Mode::Browse | Mode::Search { .. } => {}
    }
}

fn metrics_header(view: &ViewState, dashboard: &Dashboard) -> Paragraph<'static> {
    let label = Style::default().fg(Color::Gray);
    let figure = Style::default().add_modifier(Modifier::BOLD);
    let metrics = dashboard.metrics;
    let mut spans = vec![
        Span::styled("Total ", label),
        Span::styled(metrics.total.to_string(), figure),
        Span::styled("   Response ", label),
        Span::styled(format_rate(metrics.response_rate), figure),
        Span::styled("   Interview ", label),
        Span::styled(format_rate(metrics.interview_rate), figure),
        Span::styled("   Offer ", label),
        Span::styled(format_rate(metrics.offer_rate), figure.fg(Color::Green)),
    ];
    spans.push(Span::styled(
        format!("   [{}]", view.window_label()),
        Style::default().fg(Color::Cyan),
    ));
    if dashboard.is_filtered() {
        spans.push(Span::styled(
            format!("  {} of {} shown", dashboard.visible.len(), dashboard.total_records),
            label,
        ));
    }
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Job Applications")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
}

fn draw_table(
    frame: &mut Frame,
    area: Rect,
    view: &ViewState,
    dashboard: &Dashboard,
    palette: &StatusPalette,
    table_state: &mut TableState,
) {
    let block = Block::default()
        .title("Applications")
        .borders(Borders::ALL)
        .border_style(if matches!(view.mode, Mode::Browse) {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });

    if dashboard.visible.is_empty() {
        let message = if dashboard.total_records == 0 {
            "No applications found. Press `a` to add one."
        } else {
            "No applications match the current filters. Press `c` to clear them."
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray)))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let regex = build_highlight_regex(&view.criteria.search_term);
    let highlight = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let rows = dashboard.visible.iter().map(|record| {
        let (r, g, b) = palette.rgb(record.status);
        Row::new(vec![
            Cell::from(highlight_line(&record.job_title, regex.as_ref(), highlight)),
            Cell::from(highlight_line(&record.company_name, regex.as_ref(), highlight)),
            Cell::from(highlight_line(&record.location, regex.as_ref(), highlight)),
            Cell::from(format_date(record.application_date)),
            Cell::from(Span::styled(
                record.status.label(),
                Style::default().fg(Color::Rgb(r, g, b)),
            )),
            Cell::from(record.salary_range.clone().unwrap_or_default()),
        ])
    });

    let header = Row::new(vec![
        "Title", "Company", "Location", "Applied", "Status", "Salary",
    ])
    .style(
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Percentage(20),
            Constraint::Percentage(16),
            Constraint::Length(10),
            Constraint::Length(19),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::Blue)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, table_state);
}

fn draw_status_chart(frame: &mut Frame, area: Rect, dashboard: &Dashboard, palette: &StatusPalette) {
    let block = Block::default()
        .title("Status Distribution")
        .borders(Borders::ALL);
    if dashboard.distribution.is_empty() {
        frame.render_widget(no_data(block), area);
        return;
    }
    let bars: Vec<Bar> = dashboard
        .distribution
        .iter()
        .map(|slice| {
            let (r, g, b) = palette.rgb(slice.status);
            let colour = Color::Rgb(r, g, b);
            Bar::default()
                .label(Line::from(slice.status.label()))
                .value(slice.count as u64)
                .text_value(format!("{} ({})", slice.count, format_rate(slice.share * 100.0)))
                .style(Style::default().fg(colour))
                .value_style(Style::default().fg(Color::Black).bg(colour))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_timeline(frame: &mut Frame, area: Rect, timeline: &Timeline) {
    let block = Block::default()
        .title("Applications Over Time")
        .borders(Borders::ALL);
    let (Some(first), Some(last)) = (timeline.first_date(), timeline.last_date()) else {
        frame.render_widget(no_data(block), area);
        return;
    };
    let (daily, cumulative) = timeline_series(timeline);
    let span_days = ((last - first).whole_days() as f64).max(1.0);
    let y_max = timeline.points.last().map_or(1, |p| p.cumulative).max(1) as f64;

    let datasets = vec![
        Dataset::default()
            .name("daily")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&daily),
        Dataset::default()
            .name("cumulative")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&cumulative),
    ];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, span_days])
                .labels(vec![
                    Span::raw(format_date(first)),
                    Span::raw(format_date(last)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.0}"))]),
        );
    frame.render_widget(chart, area);
}

fn draw_company_chart(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let block = Block::default()
        .title("Top Companies")
        .borders(Borders::ALL);
    if dashboard.top_companies.is_empty() {
        frame.render_widget(no_data(block), area);
        return;
    }
    let bars: Vec<Bar> = dashboard
        .top_companies
        .iter()
        .map(|entry| {
            Bar::default()
                .label(Line::from(truncate_to_width(&entry.company, 18)))
                .value(entry.count as u64)
                .style(Style::default().fg(Color::Magenta))
                .value_style(Style::default().fg(Color::Black).bg(Color::Magenta))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn footer(view: &ViewState) -> Paragraph<'static> {
    let mut lines = Vec::new();
    match &view.mode {
        Mode::Search { input } => lines.push(Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{input}▌")),
        ])),
        _ => {
            let chips = view.criteria.chips();
            let text = if chips.is_empty() {
                "no filters".to_string()
            } else {
                chips.join("  ")
            };
            lines.push(Line::from(vec![
                Span::styled("Filters: ", Style::default().fg(Color::Gray)),
                Span::styled(text, Style::default().fg(Color::Cyan)),
            ]));
        }
    }
    let hint = match view.mode {
        Mode::Search { .. } => "Enter apply • Esc cancel • status:<name> from:/to:<date> date:<a>..<b>",
        Mode::Form(_) => "Tab/↓ next • ←/→ status • Ctrl-s save • Esc cancel",
        Mode::StatusPicker { .. } => "Space toggle • c clear • Enter apply • Esc cancel",
        Mode::ConfirmDelete { .. } => "y delete • n cancel",
        Mode::Browse => {
            "a add • e edit • d delete • / search • s status • w window • c clear • x export • q quit"
        }
    };
    let message = view.status_message.clone().unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled(message, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(hint, Style::default().fg(Color::Gray)),
    ]));
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn draw_form(frame: &mut Frame, form: &FormState) {
    let area = centered_rect(60, 70, frame.size());
    frame.render_widget(Clear, area);
    let title = match form.editing {
        Some(id) => format!("Edit Application #{id}"),
        None => "Add New Application".to_string(),
    };
    let mut lines = Vec::with_capacity(FormField::ALL.len() * 2 + 3);
    for field in FormField::ALL {
        let focused = field == form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if focused { "▸ " } else { "  " };
        let value = match field {
            FormField::Status => format!("◂ {} ▸", form.status.label()),
            _ if focused => format!("{}▌", form.value(field)),
            _ => form.value(field).to_string(),
        };
        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<20}", field.label()), label_style),
            Span::raw(value),
        ]));
    }
    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        "* required • dates are YYYY-MM-DD",
        Style::default().fg(Color::Gray),
    )));
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status_picker(
    frame: &mut Frame,
    cursor: usize,
    pending: &std::collections::BTreeSet<Status>,
    palette: &StatusPalette,
) {
    let area = centered_rect(40, 50, frame.size());
    frame.render_widget(Clear, area);
    let lines: Vec<Line> = Status::all()
        .enumerate()
        .map(|(index, status)| {
            let (r, g, b) = palette.rgb(status);
            let checked = if pending.contains(&status) { "[x] " } else { "[ ] " };
            let row_style = if index == cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(checked, row_style),
                Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::styled(status.label(), row_style),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Filter by Status")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(paragraph, area);
}

fn draw_confirm_delete(frame: &mut Frame, label: &str) {
    let area = centered_rect(50, 25, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            "Delete this application?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(label.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "y to delete • n or Esc to keep",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn no_data(block: Block<'static>) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        "No data to display",
        Style::default().fg(Color::Gray),
    ))
    .block(block)
}

fn highlight_line(text: &str, regex: Option<&Regex>, highlight_style: Style) -> Line<'static> {
    let spans: Vec<Span<'static>> = segments(text, regex)
        .into_iter()
        .map(|(hit, fragment)| {
            if hit {
                Span::styled(fragment.to_string(), highlight_style)
            } else {
                Span::raw(fragment.to_string())
            }
        })
        .collect();
    Line::from(spans)
}

/// Daily counts and running totals as chart points, x in days since the first date.
fn timeline_series(timeline: &Timeline) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let Some(first) = timeline.first_date() else {
        return (Vec::new(), Vec::new());
    };
    timeline
        .points
        .iter()
        .map(|point| {
            let x = (point.date - first).whole_days() as f64;
            ((x, point.count as f64), (x, point.cumulative as f64))
        })
        .unzip()
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
