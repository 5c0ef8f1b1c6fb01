use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, PickerKind, PickerOverlay};

const HEADER_HEIGHT: u16 = 4;
const STATUS_HEIGHT: u16 = 3;
const BORDER_ROWS: u16 = 2;

/// Rows available for list items inside `area`.
pub fn list_capacity(area: Rect) -> usize {
    area.height
        .saturating_sub(HEADER_HEIGHT + STATUS_HEIGHT + BORDER_ROWS)
        .max(1) as usize
}

pub fn draw_app(frame: &mut Frame, state: &AppState) {
    let list_rows = state.viewport().rows() as u16 + BORDER_ROWS;
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(list_rows),
            Constraint::Min(0),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.size());

    frame.render_widget(build_header(state), vertical[0]);
    draw_list(frame, state, vertical[1]);
    frame.render_widget(
        Paragraph::new(build_status_line(state)).block(Block::default().borders(Borders::TOP)),
        vertical[3],
    );

    if let Some(picker) = state.overlay() {
        draw_picker(frame, picker);
    }
}

fn build_header(state: &AppState) -> Paragraph<'static> {
    let labels = state.selection_labels();
    let selected = state
        .engine()
        .selected()
        .map(|item| item.label.clone())
        .unwrap_or_default();
    let dim = Style::default().fg(Color::Gray);
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled("Selected ", dim),
            Span::styled(
                selected,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("short ", dim),
            Span::raw(labels.short),
            Span::styled("  long ", dim),
            Span::raw(labels.long),
        ]),
        Line::from(vec![Span::styled("time  ", dim), Span::raw(labels.time)]),
    ]);
    Paragraph::new(text)
}

fn draw_list(frame: &mut Frame, state: &AppState, area: Rect) {
    let engine = state.engine();
    let top = state.viewport().top_index(engine);
    let rows = state.viewport().rows();

    let items: Vec<ListItem> = engine
        .items()
        .skip(top)
        .take(rows)
        .map(|item| {
            let style = if item.is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if item.is_placeholder {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let marker = if item.is_selected { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(item.label.clone(), style),
            ]))
        })
        .collect();

    let range = engine.configuration().range();
    let list = List::new(items)
        .block(
            Block::default()
                .title(range.title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    list_state.select(
        state
            .cursor_index()
            .and_then(|idx| idx.checked_sub(top))
            .filter(|row| *row < rows),
    );
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let engine = state.engine();
    let configuration = engine.configuration();
    let budget = engine.budget_remaining();
    let budget_style = if budget == 0 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::raw("Range: "),
        Span::styled(
            configuration.range().title,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Size: "),
        Span::styled(
            configuration.size().title,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Scroll: "),
        Span::styled(
            format!("{budget}/{}", engine.options().scroll_budget),
            budget_style,
        ),
    ])];

    let hint = state
        .status_message()
        .map(str::to_string)
        .unwrap_or_else(|| "j/k move · Enter select · g selection · r range · s size · q quit".into());
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
    Text::from(lines)
}

fn draw_picker(frame: &mut Frame, picker: &PickerOverlay) {
    let titles = picker.titles();
    let heading = match picker.kind {
        PickerKind::Range => "Range",
        PickerKind::Size => "Size",
    };
    let widest = titles
        .iter()
        .map(|title| title.width())
        .max()
        .unwrap_or(0)
        .max(heading.width());
    let area = popup_rect(widest as u16 + 6, titles.len() as u16 + BORDER_ROWS, frame.size());

    let items: Vec<ListItem> = titles
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            let style = if idx < picker.selected {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(*title, style))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(heading)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    let mut list_state = ListState::default();
    list_state.select(Some(picker.selected));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Configuration;
    use crate::stepper::FixedClock;
    use crate::window::{EngineOptions, WindowEngine};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use time::macros::{datetime, offset};

    fn state() -> AppState {
        let engine = WindowEngine::new(
            Configuration::default(),
            EngineOptions {
                scroll_budget: 50,
                utc_offset: offset!(+2),
            },
            FixedClock(datetime!(2026-10-17 12:00 +2)),
        );
        AppState::new(engine)
    }

    fn render(state: &AppState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| draw_app(frame, state))
            .expect("draw");
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn list_capacity_leaves_room_for_chrome() {
        assert_eq!(list_capacity(Rect::new(0, 0, 40, 24)), 15);
        assert_eq!(list_capacity(Rect::new(0, 0, 40, 5)), 1);
    }

    #[test]
    fn renders_window_without_buffer_items() {
        let state = state();
        let screen = render(&state, 48, 24);
        assert!(screen.contains("Selected 17 October"));
        assert!(screen.contains("14 October"));
        assert!(screen.contains("22 October"));
        // buffer placeholders and the trailing sentinel stay off screen
        assert!(!screen.contains("12 October"));
        assert!(!screen.contains("13 October"));
        assert!(!screen.contains("23 October"));
        assert!(screen.contains("Scroll: 50/50"));
    }

    #[test]
    fn renders_picker_overlay() {
        let mut state = state();
        state.open_picker(PickerKind::Size);
        let screen = render(&state, 48, 24);
        assert!(screen.contains("Before 0, After 6"));
    }
}
