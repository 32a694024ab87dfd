mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus, Popup};
use crate::format;
use crate::theme::Theme;
use crate::weather::WeatherSnapshot;
use components::{mini_stat, stat_card, unit_toggle};

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the palette; only the first call has an effect
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }
fn day() -> Color { theme().day }
fn night() -> Color { theme().night }

const SEARCH_PLACEHOLDER: &str = "Enter a city (e.g., Denver, Paris, Tokyo)";
const EMPTY_STATE: &str =
    "Search any city to see current conditions. No sign-ups, just fast weather for outdoor plans.";
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const UPCOMING_HOURS: usize = 6;

fn spinner() -> &'static str {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    SPINNER[(millis / 100) as usize % SPINNER.len()]
}

fn focus_style(focused: bool) -> (Style, Style) {
    if focused {
        (
            Style::default().fg(accent()),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(inactive()), Style::default().fg(inactive()))
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title + unit toggle
            Constraint::Length(3), // Search input
            Constraint::Min(6),    // Conditions
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_header(f, app, chunks[0]);
    draw_search_box(f, app, chunks[1]);
    draw_conditions(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    // Dropdown overlays the top of the conditions panel
    if !app.results.is_empty() {
        draw_results(f, app, chunks[2]);
    }

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(10)])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        " Weather Now",
        Style::default().fg(header()).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(title, chunks[0]);
    f.render_widget(Paragraph::new(unit_toggle(app.unit)), chunks[1]);
}

fn draw_search_box(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search && app.popup == Popup::None;
    let (border_style, title_style) = focus_style(focused);

    let block = Block::default()
        .title(Span::styled(" Search ", title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut spans = vec![Span::styled(" ⌕ ", Style::default().fg(text_dim()))];
    if app.query.is_empty() {
        spans.push(Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(text_dim())));
    } else {
        spans.push(Span::styled(app.query.as_str(), Style::default().fg(text())));
    }
    if app.loading_search {
        spans.push(Span::styled(format!("  {}", spinner()), Style::default().fg(accent())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);

    if focused {
        let typed = u16::try_from(Line::from(app.query.as_str()).width()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(4)
            .saturating_add(typed)
            .min(area.right().saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let height = (app.results.len() as u16 + 2).min(area.height);
    let dropdown = Rect { height, ..area };

    f.render_widget(Clear, dropdown);

    let rows: Vec<Row> = app
        .results
        .iter()
        .enumerate()
        .map(|(i, place)| {
            let row_style = if i == app.highlighted {
                Style::default().bg(bg_selected()).fg(text())
            } else {
                Style::default()
            };
            Row::new(vec![
                Span::styled("⌖", Style::default().fg(accent())),
                Span::styled(place.display_name(), Style::default().fg(text())),
                Span::styled(format::format_coordinates(place), Style::default().fg(text_dim())),
            ])
            .style(row_style)
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(2), Constraint::Min(20), Constraint::Length(18)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );

    f.render_widget(table, dropdown);
}

fn draw_conditions(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Conditions && app.popup == Popup::None;
    let (border_style, title_style) = focus_style(focused);

    let block = Block::default()
        .title(Span::styled(" Conditions ", title_style))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(place) = &app.selected else {
        let prompt = Paragraph::new(Span::styled(EMPTY_STATE, Style::default().fg(text())))
            .wrap(Wrap { trim: true });
        f.render_widget(prompt, inner);
        return;
    };

    let snapshot = app.displayed_snapshot();
    let error_height = if app.error.is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),            // "Now in" + place
            Constraint::Length(error_height), // Error line
            Constraint::Length(5),            // Hero + stat cards
            Constraint::Length(4),            // Mini stats
            Constraint::Length(4),            // Upcoming hours
            Constraint::Min(0),
        ])
        .split(inner);

    let mut place_line = vec![Span::styled(
        place.display_name(),
        Style::default().fg(text()).add_modifier(Modifier::BOLD),
    )];
    if app.loading_weather() {
        place_line.push(Span::styled(
            format!("   {} Updating…", spinner()),
            Style::default().fg(text_dim()),
        ));
    }
    let heading = Paragraph::new(vec![
        Line::from(Span::styled("NOW IN", Style::default().fg(text_dim()))),
        Line::from(place_line),
    ]);
    f.render_widget(heading, chunks[0]);

    if let Some(error) = &app.error {
        let line = Paragraph::new(Span::styled(error.as_str(), Style::default().fg(danger())));
        f.render_widget(line, chunks[1]);
    }

    if let Some(snapshot) = snapshot {
        draw_current(f, snapshot, chunks[2]);
        draw_mini_stats(f, snapshot, chunks[3]);
        draw_upcoming(f, snapshot, chunks[4]);
    }
}

fn draw_current(f: &mut Frame, snapshot: &WeatherSnapshot, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(2, 5),
            Constraint::Ratio(1, 5),
            Constraint::Ratio(1, 5),
            Constraint::Ratio(1, 5),
        ])
        .split(area);

    let current = &snapshot.current;
    let unit = snapshot.unit;
    let condition = snapshot.condition();

    let (daylight, daylight_color) = if current.is_day {
        ("☼ Daytime", day())
    } else {
        ("☾ Night", night())
    };

    let hero = Paragraph::new(vec![
        Line::from(vec![
            Span::raw(format!("{}  ", condition.icon(current.is_day))),
            Span::styled(
                format::format_temperature(current.temperature, unit),
                Style::default().fg(text()).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            if condition.is_known() { condition.label } else { format::PLACEHOLDER },
            Style::default().fg(text()),
        )),
        Line::from(Span::styled(daylight, Style::default().fg(daylight_color))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(inactive())),
    );
    f.render_widget(hero, chunks[0]);

    f.render_widget(
        stat_card(
            "Feels like",
            format::format_temperature(current.apparent_temperature, unit),
            None,
        ),
        chunks[1],
    );
    f.render_widget(
        stat_card("Humidity", format::format_humidity(current.relative_humidity), None),
        chunks[2],
    );
    f.render_widget(
        stat_card(
            "Wind",
            format::format_wind_speed(current.wind_speed, unit),
            Some(format::format_wind_direction(current.wind_direction)),
        ),
        chunks[3],
    );
}

fn draw_mini_stats(f: &mut Frame, snapshot: &WeatherSnapshot, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let updated = snapshot
        .current
        .time
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let stats = [
        ("Precip", format::format_precipitation(snapshot.current.precipitation, snapshot.unit)),
        ("Sunrise", format::format_local_time(snapshot.sunrise)),
        ("Sunset", format::format_local_time(snapshot.sunset)),
        ("Updated", format::format_local_time(Some(updated))),
    ];

    for ((label, value), chunk) in stats.into_iter().zip(chunks.iter()) {
        f.render_widget(mini_stat(label, value), *chunk);
    }
}

fn draw_upcoming(f: &mut Frame, snapshot: &WeatherSnapshot, area: Rect) {
    let hours = snapshot.upcoming_hours(UPCOMING_HOURS);
    if hours.is_empty() {
        return;
    }

    let cell = |s: String, style: Style| Span::styled(format!("{:<9}", s), style);

    let times: Vec<Span> = hours
        .iter()
        .map(|h| cell(format::format_local_time(Some(h.time)), Style::default().fg(text_dim())))
        .collect();
    let temps: Vec<Span> = hours
        .iter()
        .map(|h| {
            let value = h
                .temperature
                .map(|t| format::format_temperature(t, snapshot.unit))
                .unwrap_or_else(|| format::PLACEHOLDER.to_string());
            cell(value, Style::default().fg(text()))
        })
        .collect();
    let precip: Vec<Span> = hours
        .iter()
        .map(|h| {
            let value = h
                .precipitation_probability
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| format::PLACEHOLDER.to_string());
            cell(value, Style::default().fg(accent()))
        })
        .collect();

    let strip = Paragraph::new(vec![Line::from(times), Line::from(temps), Line::from(precip)])
        .block(
            Block::default()
                .title(Span::styled(" Next hours ", Style::default().fg(text_dim())))
                .borders(Borders::TOP)
                .border_style(Style::default().fg(inactive())),
        );
    f.render_widget(strip, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(20)])
        .split(area);

    let line = if let Some(status) = &app.status_message {
        Line::from(Span::styled(format!(" {}", status), Style::default().fg(accent())))
    } else {
        let hints: Vec<(&str, &str)> = match app.focus {
            Focus::Search => vec![
                ("type", "Search"),
                ("↑↓", "Pick"),
                ("Enter", "Select"),
                ("Esc", "Clear"),
                ("Tab", "Conditions"),
                ("F1", "Help"),
            ],
            Focus::Conditions => vec![
                ("c/f", "Units"),
                ("r", "Refresh"),
                ("/", "Search"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        };

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
            }
            spans.push(Span::styled(*key, Style::default().fg(accent())));
            spans.push(Span::styled(format!(" {}", label), Style::default().fg(text_dim())));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line), chunks[0]);
    f.render_widget(
        Paragraph::new(Span::styled("Data by Open-Meteo ", Style::default().fg(text_dim())))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };
    let heading = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        heading("═══ Search ═══"),
        key_line("type", "Search places (results appear after a short pause)"),
        key_line("↑/↓", "Move through results"),
        key_line("Enter", "Show conditions for the highlighted place"),
        key_line("Esc", "Close results, then clear the query"),
        key_line("Tab", "Switch to the conditions panel"),
        Line::from(""),
        heading("═══ Conditions ═══"),
        key_line("c / f", "Metric (°C, km/h, mm) / Imperial (°F, mph, in)"),
        key_line("u", "Toggle units"),
        key_line("r", "Fetch conditions again"),
        key_line("/ or s", "Back to search"),
        key_line("q", "Quit"),
        Line::from(""),
        heading("═══ Scripts ═══"),
        key_line("--search", "Print matching places as JSON"),
        key_line("--now", "Print current conditions as JSON"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close · Ctrl-C quits anywhere", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" weathernow Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
