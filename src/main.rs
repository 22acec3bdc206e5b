mod api;
mod app;
mod config;
mod events;
mod logging;
mod models;
mod stream;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use api::ChatClient;
use app::App;
use events::{AppEvent, ChannelListener, ExchangeEvent};
use stream::StreamError;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    logging::init(&config::get_log_path()?, &config.log_level)?;

    let client = ChatClient::from_config(&config)?;
    tracing::info!(endpoint = client.endpoint(), "sourcechat starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, client.endpoint().to_string());

    // Stream events flow from the request task to the UI loop
    let (tx, mut rx) = mpsc::unbounded_channel::<ExchangeEvent>();

    let res = run_app(&mut terminal, &mut app, &client, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "ui loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn handle_app_event(app: &mut App, tagged: ExchangeEvent) {
    if let AppEvent::Error(detail) = &tagged.event {
        tracing::debug!(exchange = tagged.exchange, %detail, "reply failed");
    }
    app.receive(tagged);
}

fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    client: &ChatClient,
    event_tx: &mpsc::UnboundedSender<ExchangeEvent>,
) -> Option<JoinHandle<()>> {
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return None;
        }
        KeyCode::Esc => {
            if app.show_info {
                app.show_info = false;
            } else if app.exit_pending {
                app.exit_pending = false;
            } else if app.is_loading {
                app.abort_generation();
            }
            return None;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_help(),
        KeyCode::Char('i') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_info(),
        KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_sources(),
        KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => app.new_conversation(),
        KeyCode::Tab => app.toggle_thinking(),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Enter if !app.is_loading => return send_question(app, client, event_tx),

        KeyCode::Char(c) => app.input_buffer.push(c),

        _ => {}
    }
    None
}

fn send_question(
    app: &mut App,
    client: &ChatClient,
    event_tx: &mpsc::UnboundedSender<ExchangeEvent>,
) -> Option<JoinHandle<()>> {
    let exchange = app.begin_exchange()?;

    let client = client.clone();
    let mut listener = ChannelListener::new(exchange.id, event_tx.clone());

    Some(tokio::spawn(async move {
        match client
            .stream_chat(&exchange.request, &mut listener, &exchange.cancel)
            .await
        {
            Ok(completion) => tracing::debug!(?completion, "exchange finished"),
            Err(StreamError::Cancelled) => tracing::debug!("exchange cancelled by user"),
            // Already surfaced to the UI through on_error
            Err(err) => tracing::debug!(error = %err, "exchange failed"),
        }
    }))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &ChatClient,
    event_tx: &mpsc::UnboundedSender<ExchangeEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<ExchangeEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Drain everything the stream produced since the last frame
        while let Ok(app_event) = event_rx.try_recv() {
            handle_app_event(app, app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && !handle_help_keys(app, key.code, key.modifiers)
                {
                    handle_keyboard_input(app, key.code, key.modifiers, client, event_tx);
                }
            }
        }

        if app.should_quit {
            app.abort_generation();
            break;
        }
    }
    Ok(())
}
