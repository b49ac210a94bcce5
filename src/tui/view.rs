use crate::storage::KeyValueStore;
use crate::tui::state::AppState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

pub fn draw<S: KeyValueStore>(f: &mut Frame, state: &mut AppState<S>) {
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(v_chunks[0]);

    // --- Timeline ---
    let rows: Vec<ListItem> = state
        .rows
        .iter()
        .map(|row| {
            let style = if row.hidden {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            let tag = format!("{:<12}", format!("[{}]", row.category.key()));
            ListItem::new(Line::from(vec![
                Span::styled(tag, Style::default().fg(Color::Cyan)),
                Span::styled(row.text.clone(), style),
            ]))
        })
        .collect();
    let shown = state.rows.iter().filter(|r| !r.hidden).count();
    let title = format!(" Timeline ({}/{} shown) ", shown, state.rows.len());
    let timeline = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        );
    f.render_stateful_widget(timeline, h_chunks[0], &mut state.list_state);

    // --- Filter panel ---
    let panel = state.engine.panel();
    if panel.is_hidden() {
        let empty = Paragraph::new("No timeline items")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Filter "));
        f.render_widget(empty, h_chunks[1]);
    } else {
        let toggles: Vec<ListItem> = panel
            .toggles()
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let checkbox = if t.checked { "[x]" } else { "[ ]" };
                let style = if t.checked {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let text = format!("{} {} {} ({})", i + 1, checkbox, t.label(), t.count);
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect();
        let list = List::new(toggles)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Filter ({}) ", panel.total())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Blue));
        f.render_stateful_widget(list, h_chunks[1], &mut state.panel_state);
    }

    // --- Footer ---
    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(v_chunks[1]);

    let status_color = if state.message.contains("Error") {
        Color::Red
    } else {
        Color::Cyan
    };
    let status = Paragraph::new(state.message.clone())
        .style(Style::default().fg(status_color))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                .title(" Status "),
        );

    let shortcuts = "1-7/Space: Toggle | a: All | p: More | n: Navigate | q: Quit";
    let help = Paragraph::new(shortcuts)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                .title(" Actions "),
        );

    f.render_widget(status, footer_chunks[0]);
    f.render_widget(help, footer_chunks[1]);
}
