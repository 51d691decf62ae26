//! gymdex CLI — terminal exercise catalog browser

use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use gymdex_app::catalog::{CatalogFeed, Filter, PageRequest};
use gymdex_app::data::favorites::{FavoritesBinding, FavoritesStore};
use gymdex_app::data::settings::Settings;
use gymdex_app::data::types::Exercise;
use gymdex_app::error::Result as AppResult;
use gymdex_app::network::MediaService;
use gymdex_app::providers::{ExerciseDbProvider, ExerciseProvider, Page};

#[derive(Parser)]
#[command(name = "gymdex", about = "Terminal exercise catalog browser", version)]
struct Cli {
    /// Free-text search (name, body part, target muscle or equipment)
    #[arg(long)]
    search: Option<String>,

    /// Filter by body part (e.g. "chest", "lower legs")
    #[arg(long)]
    body_part: Option<String>,

    /// Filter by target muscle (e.g. "abs", "biceps")
    #[arg(long)]
    target: Option<String>,

    /// Filter by equipment (e.g. "barbell", "body weight")
    #[arg(long)]
    equipment: Option<String>,

    /// RapidAPI key (overrides GYMDEX_API_KEY and the settings file)
    #[arg(long)]
    api_key: Option<String>,
}

// =============================================================================
// Fetch worker
// =============================================================================

/// Work sent to the fetch thread
enum Job {
    Page(PageRequest),
    Detail { token: u64, id: String },
    BodyParts { token: u64 },
    Gif { token: u64, exercise: Box<Exercise> },
}

/// Outcomes sent back to the UI thread. Tokens let the receiver drop
/// results that a newer request has superseded.
enum Reply {
    Page { token: u64, outcome: AppResult<Page> },
    Detail { token: u64, outcome: AppResult<Option<Exercise>> },
    BodyParts { token: u64, outcome: AppResult<Vec<String>> },
    Gif { token: u64, outcome: AppResult<PathBuf> },
}

/// Run the fetch loop (blocking, call from a dedicated thread)
fn run_worker(
    provider: Arc<dyn ExerciseProvider>,
    media: MediaService,
    jobs: Receiver<Job>,
    replies: Sender<Reply>,
) {
    for job in jobs.iter() {
        let reply = match job {
            Job::Page(req) => {
                let outcome = req.filter.fetch(provider.as_ref(), req.limit, req.offset);
                Reply::Page {
                    token: req.token,
                    outcome,
                }
            }
            Job::Detail { token, id } => Reply::Detail {
                token,
                outcome: provider.get_exercise(&id),
            },
            Job::BodyParts { token } => Reply::BodyParts {
                token,
                outcome: provider.body_parts(),
            },
            Job::Gif { token, exercise } => Reply::Gif {
                token,
                outcome: media.ensure_cached(exercise.as_ref()),
            },
        };
        if replies.send(reply).is_err() {
            break; // UI is gone
        }
    }
}

// =============================================================================
// App state
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Detail,
    Favorites,
    BodyParts,
}

struct App {
    view: View,
    feed: CatalogFeed,
    selected: usize,

    // One binding per surface that shows favorites state; the store keeps
    // them all in sync through the broadcast protocol.
    favorites: FavoritesBinding,
    favorites_page: FavoritesBinding,
    fav_selected: usize,

    detail: Option<Exercise>,
    detail_error: Option<String>,
    detail_loading: bool,
    detail_token: u64,

    body_parts: Vec<String>,
    bp_selected: usize,
    bp_error: Option<String>,
    bp_loading: bool,
    bp_token: u64,

    gif_token: u64,

    /// Some while the search prompt is open
    search_input: Option<String>,
    status: String,
    settings: Settings,
    running: bool,
}

impl App {
    fn selected_exercise(&self) -> Option<&Exercise> {
        self.feed.exercises().get(self.selected)
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.feed.len() {
            self.selected = self.feed.len().saturating_sub(1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: could not load settings: {}", e);
            Settings::default()
        }
    };

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| settings.effective_api_key())
        .unwrap_or_else(|| {
            eprintln!("No API key configured.");
            eprintln!("Set GYMDEX_API_KEY, pass --api-key, or add \"api_key\" to the settings file.");
            std::process::exit(1);
        });

    let provider: Arc<dyn ExerciseProvider> = Arc::new(
        ExerciseDbProvider::with_base_url(&settings.api_server, &api_key, &settings.api_host)
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }),
    );
    let media = match MediaService::new() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let store = FavoritesStore::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut app = App {
        view: View::List,
        feed: CatalogFeed::new(settings.page_size, settings.max_auto_loads),
        selected: 0,
        favorites: FavoritesBinding::new(&store),
        favorites_page: FavoritesBinding::new(&store),
        fav_selected: 0,
        detail: None,
        detail_error: None,
        detail_loading: false,
        detail_token: 0,
        body_parts: Vec::new(),
        bp_selected: 0,
        bp_error: None,
        bp_loading: false,
        bp_token: 0,
        gif_token: 0,
        search_input: None,
        status: String::new(),
        settings,
        running: true,
    };

    // Fetch worker + channels
    let (job_tx, job_rx) = bounded::<Job>(16);
    let (reply_tx, reply_rx) = bounded::<Reply>(16);
    std::thread::Builder::new()
        .name("fetch-worker".into())
        .spawn(move || run_worker(provider, media, job_rx, reply_tx))
        .expect("Failed to spawn fetch-worker thread");

    // First page for the filter derived from the command line
    let initial = Filter::from_params(
        cli.search.as_deref(),
        cli.body_part.as_deref(),
        cli.target.as_deref(),
        cli.equipment.as_deref(),
    );
    let first_page = match app.feed.set_filter(initial) {
        Some(req) => req,
        None => app.feed.reload(),
    };
    let _ = job_tx.send(Job::Page(first_page));

    // Suppress stderr during the TUI — the services report persistence
    // problems there, which would corrupt the ratatui display.
    let saved_stderr = unsafe { libc::dup(2) };
    {
        let devnull = std::fs::File::open("/dev/null")?;
        unsafe { libc::dup2(devnull.as_raw_fd(), 2) };
    }

    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|f| draw_ui(f, &mut app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, &job_tx);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            while let Ok(reply) = reply_rx.try_recv() {
                handle_reply(&mut app, reply);
            }
        }
    }

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    // Restore stderr
    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    if let Err(e) = app.settings.save() {
        eprintln!("Warning: could not save settings: {}", e);
    }

    Ok(())
}

// =============================================================================
// Input handling
// =============================================================================

fn handle_key(app: &mut App, code: KeyCode, jobs: &Sender<Job>) {
    // The search prompt captures everything while it is open
    if let Some(input) = app.search_input.as_mut() {
        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let query = app.search_input.take().unwrap_or_default();
                let filter = Filter::from_params(Some(query.as_str()), None, None, None);
                if let Some(req) = app.feed.set_filter(filter) {
                    app.selected = 0;
                    app.view = View::List;
                    let _ = jobs.send(Job::Page(req));
                }
            }
            KeyCode::Esc => {
                app.search_input = None;
            }
            _ => {}
        }
        return;
    }

    match app.view {
        View::List => handle_list_key(app, code, jobs),
        View::Detail => handle_detail_key(app, code, jobs),
        View::Favorites => handle_favorites_key(app, code, jobs),
        View::BodyParts => handle_body_parts_key(app, code, jobs),
    }
}

fn handle_list_key(app: &mut App, code: KeyCode, jobs: &Sender<Job>) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Up | KeyCode::Char('k') => {
            app.selected = app.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.selected + 1 < app.feed.len() {
                app.selected += 1;
            }
            // Reaching the end of the loaded list is the terminal
            // counterpart of scrolling the last card into view.
            if app.selected + 1 == app.feed.len() {
                if let Some(req) = app.feed.request_auto() {
                    let _ = jobs.send(Job::Page(req));
                }
            }
        }
        KeyCode::Enter => {
            if let Some(id) = app.selected_exercise().map(|e| e.id.clone()) {
                open_detail(app, id, jobs);
            }
        }
        KeyCode::Char('f') => {
            if let Some(exercise) = app.selected_exercise().cloned() {
                app.favorites.toggle(&exercise);
            }
        }
        KeyCode::Char('F') => {
            app.fav_selected = 0;
            app.view = View::Favorites;
        }
        KeyCode::Char('b') => {
            app.view = View::BodyParts;
            if app.body_parts.is_empty() && !app.bp_loading {
                app.bp_loading = true;
                app.bp_error = None;
                app.bp_token += 1;
                let _ = jobs.send(Job::BodyParts { token: app.bp_token });
            }
        }
        KeyCode::Char('/') => {
            app.search_input = Some(String::new());
        }
        KeyCode::Char('m') => {
            if let Some(req) = app.feed.request_more() {
                let _ = jobs.send(Job::Page(req));
            }
        }
        KeyCode::Char('r') => {
            app.selected = 0;
            let req = app.feed.reload();
            let _ = jobs.send(Job::Page(req));
        }
        KeyCode::Char('x') => {
            if let Some(req) = app.feed.set_filter(Filter::All) {
                app.selected = 0;
                let _ = jobs.send(Job::Page(req));
            }
        }
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, code: KeyCode, jobs: &Sender<Job>) {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Esc => app.view = View::List,
        KeyCode::Char('f') => {
            if let Some(exercise) = app.detail.clone() {
                app.favorites.toggle(&exercise);
            }
        }
        KeyCode::Char('g') => {
            if let Some(exercise) = app.detail.clone() {
                app.gif_token += 1;
                app.status = "Fetching GIF...".to_string();
                let _ = jobs.send(Job::Gif {
                    token: app.gif_token,
                    exercise: Box::new(exercise),
                });
            }
        }
        _ => {}
    }
}

fn handle_favorites_key(app: &mut App, code: KeyCode, jobs: &Sender<Job>) {
    let favorites = app.favorites_page.favorites();
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Esc | KeyCode::Char('F') => app.view = View::List,
        KeyCode::Up | KeyCode::Char('k') => {
            app.fav_selected = app.fav_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.fav_selected + 1 < favorites.len() {
                app.fav_selected += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(exercise) = favorites.get(app.fav_selected) {
                open_detail(app, exercise.id.clone(), jobs);
            }
        }
        KeyCode::Char('f') | KeyCode::Delete => {
            if let Some(exercise) = favorites.get(app.fav_selected) {
                app.favorites_page.remove_favorite(&exercise.id);
                if app.fav_selected + 1 >= favorites.len() {
                    app.fav_selected = app.fav_selected.saturating_sub(1);
                }
            }
        }
        KeyCode::Char('C') => {
            app.favorites_page.clear_favorites();
            app.fav_selected = 0;
        }
        _ => {}
    }
}

fn handle_body_parts_key(app: &mut App, code: KeyCode, jobs: &Sender<Job>) {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Esc | KeyCode::Char('b') => app.view = View::List,
        KeyCode::Up | KeyCode::Char('k') => {
            app.bp_selected = app.bp_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.bp_selected + 1 < app.body_parts.len() {
                app.bp_selected += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(part) = app.body_parts.get(app.bp_selected).cloned() {
                if let Some(req) = app.feed.set_filter(Filter::BodyPart(part)) {
                    app.selected = 0;
                    let _ = jobs.send(Job::Page(req));
                }
                app.view = View::List;
            }
        }
        _ => {}
    }
}

fn open_detail(app: &mut App, id: String, jobs: &Sender<Job>) {
    app.view = View::Detail;
    app.detail = None;
    app.detail_error = None;
    app.detail_loading = true;
    app.status.clear();
    app.detail_token += 1;
    let _ = jobs.send(Job::Detail {
        token: app.detail_token,
        id,
    });
}

// =============================================================================
// Reply handling
// =============================================================================

fn handle_reply(app: &mut App, reply: Reply) {
    match reply {
        Reply::Page { token, outcome } => {
            if app.feed.apply(token, outcome) {
                app.clamp_selection();
            }
        }
        Reply::Detail { token, outcome } => {
            if token != app.detail_token {
                return; // superseded by a newer detail request
            }
            app.detail_loading = false;
            match outcome {
                Ok(Some(exercise)) => {
                    app.settings.last_viewed = Some(exercise.clone());
                    app.detail = Some(exercise);
                }
                Ok(None) => app.detail_error = Some("Exercise not found".to_string()),
                Err(e) => app.detail_error = Some(e.to_string()),
            }
        }
        Reply::BodyParts { token, outcome } => {
            if token != app.bp_token {
                return;
            }
            app.bp_loading = false;
            match outcome {
                Ok(parts) => {
                    app.body_parts = parts;
                    app.bp_selected = 0;
                }
                Err(e) => app.bp_error = Some(e.to_string()),
            }
        }
        Reply::Gif { token, outcome } => {
            if token != app.gif_token {
                return;
            }
            app.status = match outcome {
                Ok(path) => format!("GIF saved to {}", path.display()),
                Err(e) => format!("GIF fetch failed: {}", e),
            };
        }
    }
}

// =============================================================================
// Drawing
// =============================================================================

fn draw_ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Navigation badge: live favorites count
    let title = format!(
        " gymdex v{} — ♥ {} ",
        env!("CARGO_PKG_VERSION"),
        app.favorites.count()
    );
    let outer = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // heading
        Constraint::Min(3),    // body
        Constraint::Length(2), // help / search prompt
    ])
    .split(inner);

    draw_heading(f, app, chunks[0]);
    match app.view {
        View::List => draw_list(f, app, chunks[1]),
        View::Detail => draw_detail(f, app, chunks[1]),
        View::Favorites => draw_favorites(f, app, chunks[1]),
        View::BodyParts => draw_body_parts(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);
}

fn draw_heading(f: &mut Frame, app: &App, area: Rect) {
    let heading = match app.view {
        View::List => {
            let mut line = format!("  {}", app.feed.filter().title());
            if !app.feed.is_empty() {
                line.push_str(&format!(" — {} loaded", app.feed.len()));
            }
            if app.feed.auto_load_exhausted() {
                line.push_str("  (press m for more)");
            }
            line
        }
        View::Detail => "  Exercise detail".to_string(),
        View::Favorites => format!("  Favorites — {}", app.favorites_page.count()),
        View::BodyParts => "  Body parts".to_string(),
    };

    let text = vec![
        Line::from(Span::styled(
            heading,
            Style::default().fg(Color::White).bold(),
        )),
        Line::default(),
    ];
    f.render_widget(Paragraph::new(text), area);
}

fn draw_list(f: &mut Frame, app: &mut App, area: Rect) {
    if let Some(error) = app.feed.error() {
        draw_error(f, area, error, "press 'r' to retry");
        return;
    }
    if app.feed.is_empty() {
        let message = if app.feed.is_loading() {
            "Loading exercises..."
        } else {
            "No exercises found. Change the filter and try again."
        };
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .feed
        .exercises()
        .iter()
        .map(|e| exercise_row(e, app.favorites.is_favorite(&e.id)))
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);

    if app.feed.is_loading() {
        let y = area.bottom().saturating_sub(1);
        let status_area = Rect::new(area.x, y, area.width, 1);
        f.render_widget(
            Paragraph::new("Loading more...").style(Style::default().fg(Color::Yellow)),
            status_area,
        );
    }
}

fn exercise_row(exercise: &Exercise, is_favorite: bool) -> ListItem<'static> {
    let heart = if is_favorite { "♥ " } else { "  " };
    ListItem::new(Line::from(vec![
        Span::styled(heart.to_string(), Style::default().fg(Color::Red)),
        Span::styled(exercise.name.clone(), Style::default().fg(Color::White)),
        Span::styled(
            format!("  {} · {}", exercise.body_part, exercise.target),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
}

fn draw_detail(f: &mut Frame, app: &App, area: Rect) {
    if app.detail_loading {
        f.render_widget(
            Paragraph::new("Loading exercise...").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }
    if let Some(error) = &app.detail_error {
        draw_error(f, area, error, "press Esc to go back");
        return;
    }
    let Some(exercise) = &app.detail else {
        return;
    };

    let field = |label: &str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", label), Style::default().fg(Color::DarkGray)),
            Span::styled(value.to_string(), Style::default().fg(Color::White)),
        ])
    };

    let favorite = if app.favorites.is_favorite(&exercise.id) {
        "♥ favorited"
    } else {
        "not favorited"
    };

    let mut text = vec![
        Line::from(Span::styled(
            format!("  {}", exercise.name),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::default(),
        field("ID:", &exercise.id),
        field("Body part:", &exercise.body_part),
        field("Target:", &exercise.target),
        field("Equipment:", &exercise.equipment),
        field("GIF:", &exercise.gif_url),
        Line::default(),
        Line::from(Span::styled(
            format!("  {}", favorite),
            Style::default().fg(Color::Red),
        )),
    ];
    if !app.status.is_empty() {
        text.push(Line::default());
        text.push(Line::from(Span::styled(
            format!("  {}", app.status),
            Style::default().fg(Color::Yellow),
        )));
    }

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), area);
}

fn draw_favorites(f: &mut Frame, app: &mut App, area: Rect) {
    let favorites = app.favorites_page.favorites();
    if favorites.is_empty() {
        f.render_widget(
            Paragraph::new("No favorites yet. Press 'f' on an exercise to add it.")
                .style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = favorites.iter().map(|e| exercise_row(e, true)).collect();

    let mut state = ListState::default();
    state.select(Some(app.fav_selected.min(favorites.len() - 1)));

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_body_parts(f: &mut Frame, app: &mut App, area: Rect) {
    if let Some(error) = &app.bp_error {
        draw_error(f, area, error, "press Esc to go back");
        return;
    }
    if app.bp_loading {
        f.render_widget(
            Paragraph::new("Loading body parts...").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .body_parts
        .iter()
        .map(|p| ListItem::new(format!("  {}", p)))
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.bp_selected));

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_error(f: &mut Frame, area: Rect, error: &str, hint: &str) {
    let text = vec![
        Line::from(Span::styled(
            format!("  Something went wrong: {}", error),
            Style::default().fg(Color::Red),
        )),
        Line::from(Span::styled(
            format!("  {}", hint),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(input) = &app.search_input {
        Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(Color::Yellow)),
            Span::styled(input.clone(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
            Span::styled("  (enter apply, esc cancel)", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let keys: &[(&str, &str)] = match app.view {
            View::List => &[
                ("enter", "detail"),
                ("f", "fav"),
                ("/", "search"),
                ("b", "body parts"),
                ("F", "favorites"),
                ("m", "more"),
                ("x", "clear filter"),
                ("q", "quit"),
            ],
            View::Detail => &[("f", "fav"), ("g", "save gif"), ("esc", "back"), ("q", "quit")],
            View::Favorites => &[
                ("enter", "detail"),
                ("f", "remove"),
                ("C", "clear all"),
                ("esc", "back"),
            ],
            View::BodyParts => &[("enter", "filter"), ("esc", "back")],
        };

        let mut spans = Vec::new();
        for (i, (key, action)) in keys.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("'{}' ", key),
                Style::default().fg(Color::Yellow),
            ));
            spans.push(Span::raw(action.to_string()));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line), area);
}
