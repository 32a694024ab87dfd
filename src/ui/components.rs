//! Small building blocks for the conditions panel

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{accent, inactive, text, text_dim};
use crate::weather::Unit;

/// Bordered card: dim label, bold value, optional dim sub-line
pub fn stat_card<'a>(label: &'a str, value: String, sub: Option<String>) -> Paragraph<'a> {
    let mut lines = vec![
        Line::from(Span::styled(label, Style::default().fg(text_dim()))),
        Line::from(Span::styled(
            value,
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(sub) = sub {
        lines.push(Line::from(Span::styled(sub, Style::default().fg(text_dim()))));
    }

    Paragraph::new(lines).block(card_block())
}

/// Compact centered label/value pair
pub fn mini_stat<'a>(label: &'a str, value: String) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            label.to_uppercase(),
            Style::default().fg(text_dim()),
        )),
        Line::from(Span::styled(
            value,
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(card_block())
}

/// "°C │ °F" with the active unit highlighted
pub fn unit_toggle(unit: Unit) -> Line<'static> {
    let style_for = |u: Unit| {
        if u == unit {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(text_dim())
        }
    };

    Line::from(vec![
        Span::styled(" °C ", style_for(Unit::Metric)),
        Span::styled("│", Style::default().fg(inactive())),
        Span::styled(" °F ", style_for(Unit::Imperial)),
    ])
}

fn card_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()))
}
