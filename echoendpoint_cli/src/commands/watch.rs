//! Watch command - live inbox in the terminal

use crate::client::ApiClient;
use crate::config::Config;
use crate::inbox::{format_timestamp, DetailView, InboxEvent, InboxRuntime, NoticeKind, ViewSink};
use crate::stream::StreamStatus;
use crate::tui::{self, KeyAction, TuiApp};
use anyhow::{Context, Result};
use console::style;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use echoendpoint_common::{RequestId, RequestSummary};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Run the live inbox, either full screen or as a plain line log
pub async fn run(config: &Config, plain: bool) -> Result<()> {
    let token = config.require_token()?.to_string();
    let client = ApiClient::new(config.base_url()).context("Failed to create HTTP client")?;

    if plain {
        run_plain(config, client, token).await
    } else {
        run_with_tui(config, client, token).await
    }
}

/// Run with full TUI
async fn run_with_tui(config: &Config, client: ApiClient, token: String) -> Result<()> {
    let app = TuiApp::new(config.webhook_url(&token));
    let (mut runtime, mut events_rx) = InboxRuntime::new(app, client, token, config.page_limit);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui_loop(&mut terminal, &mut runtime, &mut events_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut InboxRuntime<TuiApp>,
    events_rx: &mut mpsc::Receiver<InboxEvent>,
) -> Result<()> {
    runtime.start();
    // Torn down when the loop returns
    let _stream = runtime.spawn_stream();

    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));

    loop {
        runtime.sink_mut().expire_notices(Instant::now());
        let stream_status = runtime.stream_status();
        terminal.draw(|f| tui::draw(f, runtime.sink(), stream_status))?;

        tokio::select! {
            // Handle keyboard events (non-blocking)
            _ = tick_interval.tick() => {
                while event::poll(Duration::from_millis(0))? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match runtime.sink_mut().handle_key(key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Command(command) => runtime.handle_command(command),
                        KeyAction::None => {}
                    }
                }
            }

            // Network completions and pushed events
            Some(event) = events_rx.recv() => {
                runtime.handle_event(event);
            }
        }
    }
}

/// Prints every request as it lands in the inbox
#[derive(Debug, Default)]
pub struct PlainSink {
    printed: usize,
}

impl PlainSink {
    pub fn printed(&self) -> usize {
        self.printed
    }

    fn print(&mut self, item: &RequestSummary, live: bool) {
        self.printed += 1;
        let marker = if live {
            style("new").green().bold().to_string()
        } else {
            style("   ").dim().to_string()
        };
        println!("{} {}", marker, format_line(item));
    }
}

impl ViewSink for PlainSink {
    fn render_list_appended(&mut self, item: &RequestSummary) {
        self.print(item, false);
    }

    fn render_list_prepended(&mut self, item: &RequestSummary) {
        self.print(item, true);
    }

    fn render_list_cleared(&mut self) {
        println!("{}", style("-- inbox cleared --").dim());
    }

    fn render_count(&mut self, _count: usize) {}

    fn render_active(&mut self, _id: Option<&RequestId>) {}

    fn render_detail(&mut self, _detail: &DetailView) {}

    fn render_detail_loading(&mut self) {}

    fn render_detail_empty(&mut self) {}

    fn notify(&mut self, kind: NoticeKind, title: &str, message: &str) {
        let title = match kind {
            NoticeKind::Success => style(title).green(),
            NoticeKind::Failure => style(title).red(),
            NoticeKind::Info => style(title).cyan(),
        };
        eprintln!("{} {}", title.bold(), message);
    }
}

/// `<time>  <METHOD> <path>  #<id>`
pub fn format_line(item: &RequestSummary) -> String {
    format!(
        "{}  {:>7} {}  #{}",
        format_timestamp(item.received_at.as_ref()),
        item.display_method(),
        item.display_path(),
        item.id
    )
}

async fn run_plain(config: &Config, client: ApiClient, token: String) -> Result<()> {
    println!(
        "{} {}",
        style("Watching").dim(),
        style(config.webhook_url(&token)).cyan().bold()
    );
    println!("{}", style("Press Ctrl+C to stop.").dim());

    let (mut runtime, mut events_rx) =
        InboxRuntime::new(PlainSink::default(), client, token, config.page_limit);
    runtime.start();
    let _stream = runtime.spawn_stream();

    let mut last_status = runtime.stream_status();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = events_rx.recv() => {
                runtime.handle_event(event);
                let status = runtime.stream_status();
                if status != last_status {
                    last_status = status;
                    print_status(status);
                }
            }
        }
    }

    println!();
    println!("{} requests shown.", runtime.sink().printed());
    Ok(())
}

fn print_status(status: StreamStatus) {
    let label = match status {
        StreamStatus::Live => style(status.as_str()).green(),
        StreamStatus::Connecting | StreamStatus::Reconnecting => style(status.as_str()).yellow(),
        StreamStatus::Closed => style(status.as_str()).red(),
    };
    eprintln!("{} {}", style("stream").dim(), label);
}
