use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use shell_words::split as shell_split;
use tokio::sync::mpsc;
use tracing::{info, warn};

use mailroom_api::{ApiEngine, ApiEvent, HttpBackend};
use mailroom_core::{MailBackend, Mailbox, MemoryBackend, init_logging};

mod app_lifecycle_mod;
mod cli;
mod compose_mod;
mod config_mod;
mod detail_view_mod;
mod events_mod;
mod input_compose_mod;
mod input_main_mod;
mod mailbox_view_mod;
mod router_mod;
mod ui_theme_mod;
mod util_mod;

#[cfg(test)]
mod test_support;

use crate::cli::{Cli, output_error, resolve_cli_command, run_cli};
use crate::compose_mod::{ComposeFocus, ComposeMode, ComposeView, render_compose_view};
use crate::config_mod::{AppConfig, load_app_config};
use crate::detail_view_mod::{DetailView, render_detail_view};
use crate::events_mod::ArchiveReload;
use crate::mailbox_view_mod::{MailboxView, render_mailbox_view};
use crate::util_mod::{
    apply_input_key, cursor_line_col, move_cursor_left, move_cursor_right, scroll_to_cursor,
    set_cursor_at,
    text_char_len, truncate_label,
};

const TICK_RATE: Duration = Duration::from_millis(200);
const CLI_SCHEMA_VERSION: &str = "mailroom.cli.v1";
const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// The one screen currently shown. Replaces the show/hide pair of page sections.
#[derive(Debug, Clone)]
enum View {
    Mailbox(MailboxView),
    Detail(DetailView),
    Compose(ComposeView),
}

struct App {
    view: View,
    /// Bumped on every transition; responses tagged with an older value are dropped.
    generation: u64,
    last_mailbox: Mailbox,
    archive_reload: Option<ArchiveReload>,
    engine: ApiEngine,
    events: mpsc::Receiver<ApiEvent>,
    ui_theme: Arc<UiTheme>,
    server_label: String,
    show_help: bool,
    pending: usize,
    spinner: usize,
    last_tick: Instant,
}

#[derive(Debug, Clone)]
struct UiTheme {
    base: Style,
    border: Style,
    bar: Style,
    show_bars: bool,
    accent: Style,
    focus_bg: Style,
    table_header: Style,
    unread: Style,
    read: Style,
    link: Style,
    label: Style,
    label_focus: Style,
    control: Style,
    separator: Style,
}

fn main() -> Result<()> {
    if let Err(err) = init_logging() {
        eprintln!("mailroom: logging disabled: {}", err);
    }
    let cli = Cli::parse();
    let demo = cli.demo;
    let config = load_app_config();
    let (cli_requested, cli_command) = match resolve_cli_command(cli) {
        Ok(result) => result,
        Err(err) => {
            return output_error(&err.to_string());
        }
    };

    let rt = Arc::new(tokio::runtime::Runtime::new()?);
    let backend = match build_backend(&config, demo) {
        Ok(backend) => backend,
        Err(err) => {
            if cli_requested {
                return output_error(&err.to_string());
            }
            return Err(err);
        }
    };

    if cli_requested {
        let Some(command) = cli_command else {
            return output_error("No command provided");
        };
        if let Err(err) = run_cli(&rt, command, backend.as_ref()) {
            return output_error(&err.to_string());
        }
        return Ok(());
    }

    let server_label = if demo {
        "demo".to_string()
    } else {
        config.server.base_url.clone()
    };
    info!(server = %server_label, theme = %config.ui.theme, "starting ui");
    let (engine, events) = {
        let _guard = rt.enter();
        ApiEngine::start(backend)
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    let app = App::new(
        engine,
        events,
        Arc::new(UiTheme::from_name(&config.ui.theme)),
        server_label,
        config.ui.show_help,
    );
    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Ok(rt) = Arc::try_unwrap(rt) {
        rt.shutdown_timeout(Duration::from_millis(200));
    }
    res
}

fn build_backend(config: &AppConfig, demo: bool) -> Result<Arc<dyn MailBackend>> {
    if demo {
        warn!("using in-memory demo backend");
        return Ok(Arc::new(MemoryBackend::demo()));
    }
    Ok(Arc::new(HttpBackend::new(&config.server.http_config())?))
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui(frame, &mut app))?;

        app.drain_channels();

        let timeout = TICK_RATE.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if app.on_key(key) {
                    return Ok(());
                }
            }
        }

        if app.last_tick.elapsed() >= TICK_RATE {
            app.last_tick = Instant::now();
            app.on_tick();
        }
    }
}

fn ui(frame: &mut ratatui::Frame, app: &mut App) {
    let area = frame.area();
    frame.render_widget(Block::default().style(app.ui_theme.base), area);
    let help_height = if app.show_help { 3 } else { 2 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(help_height),
        ])
        .split(area);

    render_status_bar(frame, layout[0], app);
    let theme = app.ui_theme.clone();
    match &mut app.view {
        View::Mailbox(view) => render_mailbox_view(frame, layout[1], view, &theme),
        View::Detail(view) => render_detail_view(frame, layout[1], view, &theme),
        View::Compose(view) => render_compose_view(frame, layout[1], view, &theme),
    }
    render_help_bar(frame, layout[2], app);
}

fn render_status_bar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(" mailroom ", app.ui_theme.accent),
        Span::raw(format!(" server: {} ", truncate_label(&app.server_label, 40))),
    ];
    for mailbox in Mailbox::ALL {
        let active = matches!(&app.view, View::Mailbox(view) if view.mailbox == mailbox);
        let style = if active {
            app.ui_theme.label_focus
        } else {
            app.ui_theme.label
        };
        spans.push(Span::styled(format!(" {} ", mailbox.heading()), style));
    }
    let compose_style = if matches!(app.view, View::Compose(_)) {
        app.ui_theme.label_focus
    } else {
        app.ui_theme.label
    };
    spans.push(Span::styled(" Compose ", compose_style));
    if app.pending > 0 {
        spans.push(Span::raw(format!(" {} ", SPINNER_FRAMES[app.spinner])));
    }
    let block = Block::default()
        .borders(if app.ui_theme.show_bars {
            Borders::BOTTOM
        } else {
            Borders::NONE
        })
        .style(app.ui_theme.bar)
        .border_style(app.ui_theme.border);
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(app.ui_theme.bar)
            .block(block),
        area,
    );
}

fn render_help_bar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let help = match &app.view {
        View::Mailbox(_) => {
            "j/k move  Enter open  a archive/unarchive  r reload  i inbox  s sent  A archive  c compose  ? help  q quit"
        }
        View::Detail(_) => {
            "j/k scroll  R reply  Esc back  i inbox  s sent  A archive  c compose  ? help  q quit"
        }
        View::Compose(_) => "Tab/Shift+Tab field  Ctrl+S send  Esc discard",
    };
    let text = if app.show_help {
        format!("{}\nlog: set MAILROOM_LOG=debug to write mailroom.log", help)
    } else {
        help.to_string()
    };
    let block = Block::default()
        .borders(if app.ui_theme.show_bars {
            Borders::TOP
        } else {
            Borders::NONE
        })
        .style(app.ui_theme.bar)
        .border_style(app.ui_theme.border);
    frame.render_widget(
        Paragraph::new(text).style(app.ui_theme.bar).block(block),
        area,
    );
}
