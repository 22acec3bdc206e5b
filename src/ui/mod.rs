pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

/// Height of the input box: wrapped text lines plus two border rows
pub fn input_height(input: &str, width: u16, screen_height: u16) -> u16 {
    // Text area excludes the borders
    let available_width = (width.saturating_sub(2) as usize).max(1);
    let input_lines = input.chars().count().div_ceil(available_width).max(1);

    // At most about half the screen
    let max_lines = (screen_height as usize / 2).saturating_sub(2).max(1);
    let actual_lines = input_lines.min(max_lines);

    u16::try_from(actual_lines + 2).unwrap_or(u16::MAX)
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let input_height = input_height(&app.input_buffer, area.width, area.height);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                // Chat history
            Constraint::Length(1),             // Gap
            Constraint::Length(1),             // Status line
            Constraint::Length(input_height),  // Input field
            Constraint::Length(1),             // Key bar
        ])
        .split(area);

    widgets::render_chat_history(frame, app, chunks[0]);
    widgets::render_status_bar(frame, app, chunks[2]);
    widgets::render_input_field(frame, app, chunks[3]);
    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, app, area);
    }

    if app.show_info {
        widgets::render_info_window(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AppEvent;
    use crate::models::AppConfig;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_input_height() {
        assert_eq!(input_height("", 40, 40), 3);
        // 38 usable columns, 76 chars wrap onto two lines
        assert_eq!(input_height(&"x".repeat(76), 40, 40), 4);
        // Clamped to half the screen
        assert_eq!(input_height(&"x".repeat(1000), 40, 10), 5);
    }

    #[test]
    fn test_render_streaming_reply() {
        let mut app = App::new(&AppConfig::default(), "http://localhost".to_string());
        app.input_buffer = "How tall?".to_string();
        app.begin_exchange();
        app.apply_event(AppEvent::Answer("Twelve metres".to_string()));
        app.show_help = true;
        app.show_info = true;

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains("Session Information"));
    }
}
