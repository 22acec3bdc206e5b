use std::str::FromStr;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::models::{Message, Role};

/// Parse a configured colour name, keeping `fallback` for unknown names
pub fn theme_color(name: &str, fallback: Color) -> Color {
    Color::from_str(name).unwrap_or(fallback)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;

    Rect {
        x: area.x + x,
        y: area.y + y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn popup<'a>(lines: Vec<Line<'a>>, title: &'a str, border: Color) -> Paragraph<'a> {
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: false })
}

pub fn render_help_window(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let border = theme_color(&app.theme.border_color, Color::Cyan);

    let help_text = vec![
        Line::from(Span::styled(
            "SourceChat - Keyboard Shortcuts",
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("General:", bold)),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+I        - Show/hide session info"),
        Line::from("  Ctrl+N        - New conversation"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C (x2)   - Quit application"),
        Line::from(""),
        Line::from(Span::styled("Chat:", bold)),
        Line::from("  Enter         - Send question"),
        Line::from("  Esc           - Stop the running answer"),
        Line::from("  Tab           - Show/hide reasoning"),
        Line::from("  Ctrl+S        - Show/hide sources"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", bold)),
        Line::from("  Up/Down       - Scroll history"),
        Line::from("  PgUp/PgDn     - Scroll history"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup_area = centered(area, 60, 24);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup(help_text, " Help ", border), popup_area);
}

pub fn render_info_window(frame: &mut Frame, app: &App, area: Rect) {
    let border = theme_color(&app.theme.border_color, Color::Cyan);
    let model = app
        .last_done
        .as_ref()
        .and_then(|d| d.model.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let context_used = app
        .last_done
        .as_ref()
        .and_then(|d| d.context_used)
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let sources = app.messages.last().map_or(0, |m| m.sources.len());

    let info_text = vec![
        Line::from(Span::styled(
            "Session Information",
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Endpoint: "),
            Span::styled(app.endpoint.clone(), Style::default().fg(Color::Blue)),
        ]),
        Line::from(vec![
            Span::raw("Model: "),
            Span::styled(model, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Context Used: "),
            Span::styled(context_used, Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw("Sources (last reply): "),
            Span::styled(sources.to_string(), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::raw("Messages: "),
            Span::styled(app.messages.len().to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+I to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup_area = centered(area, 56, 12);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup(info_text, " Info ", border), popup_area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if app.is_loading {
        (
            "Esc: Stop | Tab: Reasoning | Ctrl+S: Sources | Ctrl+H: Help",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            "Ctrl+C: Quit | Ctrl+N: New | Ctrl+I: Info | Ctrl+H: Help | Tab: Reasoning",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text).alignment(Alignment::Center).style(style);

    frame.render_widget(bar, area);
}

pub fn status_text(app: &App) -> String {
    let mut parts = Vec::new();

    if let Some(phase) = app.phase() {
        parts.push(format!("[{phase}]"));
    }
    if let Some(done) = &app.last_done {
        if let Some(model) = &done.model {
            parts.push(model.clone());
        }
        if let Some(used) = done.context_used {
            parts.push(format!("context: {used}"));
        }
    }
    if parts.is_empty() {
        parts.push("ready".to_string());
    }

    parts.join(" ")
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let color = if app.is_loading {
        Color::Yellow
    } else if app.messages.last().is_some_and(|m| m.error.is_some()) {
        Color::Red
    } else {
        Color::Green
    };

    let status = Paragraph::new(status_text(app))
        .alignment(Alignment::Right)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

    frame.render_widget(status, area);
}

fn render_sources(lines: &mut Vec<Line<'static>>, message: &Message) {
    lines.push(Line::from(Span::styled(
        format!("  Sources ({})", message.sources.len()),
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    )));
    for (i, source) in message.sources.iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!("    [{}] {}", i + 1, source.display_name()),
            Style::default().fg(Color::Magenta),
        )];
        if let Some(score) = source.score {
            spans.push(Span::styled(
                format!("  ({score:.2})"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }
}

fn render_thinking(lines: &mut Vec<Line<'static>>, message: &Message, expanded: bool, color: Color) {
    if expanded {
        lines.push(Line::from(Span::styled(
            "  <thinking>",
            Style::default().fg(color),
        )));
        for thought in message.thinking.lines() {
            lines.push(Line::from(Span::styled(
                format!("        {thought}"),
                Style::default().fg(color),
            )));
        }
        lines.push(Line::from(Span::styled(
            "  </thinking>",
            Style::default().fg(color),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "    | Assistant reasoning (Hidden, Tab to show)",
            Style::default().fg(color).add_modifier(Modifier::ITALIC),
        )));
    }
}

fn render_answer(lines: &mut Vec<Line<'static>>, content: &str) {
    let mut in_code_block = false;

    for content_line in content.lines() {
        if content_line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(Line::from(Span::styled(
                content_line.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {content_line}"),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(Line::from(content_line.to_string()));
        }
    }
}

pub fn message_lines(app: &App) -> Vec<Line<'static>> {
    let user_color = theme_color(&app.theme.user_message_color, Color::Cyan);
    let assistant_color = theme_color(&app.theme.assistant_message_color, Color::Green);
    let thinking_color = theme_color(&app.theme.thinking_color, Color::DarkGray);
    let mut lines = Vec::new();

    for message in &app.messages {
        let color = match message.role {
            Role::User => user_color,
            Role::Assistant => assistant_color,
        };

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("## {}", message.role.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        if app.show_sources && !message.sources.is_empty() {
            render_sources(&mut lines, message);
            lines.push(Line::from(""));
        }

        if !message.thinking.is_empty() {
            render_thinking(&mut lines, message, app.show_thinking, thinking_color);
            lines.push(Line::from(""));
        }

        if !message.content.is_empty() {
            render_answer(&mut lines, &message.content);
        } else if message.error.is_none() {
            // Placeholder while the answer streams in
            lines.push(Line::from(Span::styled("...", Style::default().fg(Color::DarkGray))));
        }

        if let Some(error) = &message.error {
            lines.push(Line::from(Span::styled(
                format!("Error: {error}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
    }

    lines
}

pub fn render_chat_history(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.messages.is_empty() {
        let welcome_text = vec![
            Line::from(Span::styled(
                "Welcome to SourceChat",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Ask a question; answers cite the documents they draw on",
                Style::default().fg(Color::Cyan),
            )),
        ];

        // Sit the banner at the bottom of the history area
        let welcome_height = 2;
        let welcome_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(welcome_height),
            width: area.width,
            height: welcome_height.min(area.height),
        };

        frame.render_widget(
            Paragraph::new(welcome_text).alignment(Alignment::Center),
            welcome_area,
        );
        return;
    }

    let lines = message_lines(app);

    // Wrapped height decides how far we can scroll
    let available_width = (area.width as usize).max(1);
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = area.height as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.scroll_offset.min(max_scroll);
    app.scroll_offset = actual_scroll;

    let chat_history = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(chat_history, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let border = theme_color(&app.theme.border_color, Color::Cyan);
    let (input_text, input_style) = if app.input_buffer.is_empty() {
        ("Ask a question...", Style::default().fg(Color::Gray))
    } else {
        (
            app.input_buffer.as_str(),
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        )
    };

    let input = Paragraph::new(input_text)
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AppEvent;
    use crate::models::{AppConfig, DoneMetadata, Source};

    fn app() -> App {
        App::new(&AppConfig::default(), "http://localhost:8000/api/chat/stream".to_string())
    }

    fn rendered(app: &App) -> Vec<String> {
        message_lines(app).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_theme_color() {
        assert_eq!(theme_color("green", Color::Red), Color::Green);
        assert_eq!(theme_color("no-such-colour", Color::Red), Color::Red);
    }

    #[test]
    fn test_status_text_phases() {
        let mut app = app();
        assert_eq!(status_text(&app), "ready");

        app.input_buffer = "q".to_string();
        app.begin_exchange();
        assert_eq!(status_text(&app), "[Waiting...]");

        app.apply_event(AppEvent::Thinking("t".to_string()));
        assert_eq!(status_text(&app), "[Thinking...]");

        app.apply_event(AppEvent::Done(DoneMetadata {
            model: Some("x".to_string()),
            context_used: Some(4),
        }));
        assert_eq!(status_text(&app), "x context: 4");
    }

    #[test]
    fn test_thinking_hidden_by_default() {
        let mut app = app();
        app.input_buffer = "q".to_string();
        app.begin_exchange();
        app.apply_event(AppEvent::Thinking("secret plan".to_string()));

        let lines = rendered(&app);
        assert!(!lines.iter().any(|l| l.contains("secret plan")));
        assert!(lines.iter().any(|l| l.contains("reasoning (Hidden")));

        app.toggle_thinking();
        assert!(rendered(&app).iter().any(|l| l.contains("secret plan")));
    }

    #[test]
    fn test_sources_listed() {
        let mut app = app();
        app.input_buffer = "q".to_string();
        app.begin_exchange();
        app.apply_event(AppEvent::Sources(vec![Source {
            title: Some("Zoning plan".to_string()),
            score: Some(0.9),
            ..Source::default()
        }]));

        let lines = rendered(&app);
        assert!(lines.iter().any(|l| l.contains("[1] Zoning plan")));

        app.toggle_sources();
        assert!(!rendered(&app).iter().any(|l| l.contains("Zoning plan")));
    }

    #[test]
    fn test_error_rendered() {
        let mut app = app();
        app.input_buffer = "q".to_string();
        app.begin_exchange();
        app.apply_event(AppEvent::Error("HTTP 502: bad gateway".to_string()));

        let lines = rendered(&app);
        assert!(lines.iter().any(|l| l == "Error: HTTP 502: bad gateway"));
        assert!(!lines.iter().any(|l| l == "..."));
    }
}
