// Terminal UI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator has told
// it. The orchestrator pushes `UiUpdate` messages over an mpsc channel; the
// TUI applies them to `ViewState` and re-renders at the configured frame rate.

pub mod input;
pub mod layout;
pub mod theme;
pub mod widgets;

use std::collections::{HashMap, VecDeque};
use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream};
use crossterm::execute;
use futures_util::StreamExt;
use ratatui::layout::Rect;
use ratatui::Frame;
use tokio::sync::mpsc;

use gomoku_core::board::{Cell, BOARD_SIZE};
use gomoku_core::config::Config;
use gomoku_core::message::{ImageInfo, RoomSummary};
use gomoku_core::prefs::Theme;
use gomoku_core::session::ChatLine;

use crate::protocol::{ConnectionStatus, GameSnapshot, Screen, UiUpdate, UserCommand};

use layout::build_layout;
use theme::Palette;

/// How long a status-bar notice stays visible.
const NOTICE_DURATION: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// Input state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Nickname,
    SkinPath,
}

/// What a one-line text prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    RoomName,
    Chat,
    UploadPath,
    LinkUrl,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::RoomName => "Room name",
            PromptKind::Chat => "Chat",
            PromptKind::UploadPath => "Image file",
            PromptKind::LinkUrl => "Image URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Prompt {
            kind,
            text: String::new(),
        }
    }
}

/// Victory banner currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Celebration {
    pub winner_name: Option<String>,
    pub until: Instant,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    pub screen: Screen,
    pub theme: Theme,
    pub nickname: String,
    pub skin_url: Option<String>,
    pub connection_status: ConnectionStatus,

    // Login form
    pub login_nickname: String,
    pub login_skin: String,
    pub login_focus: LoginField,
    /// Set once a login is submitted, until the app moves on or alerts.
    pub login_pending: bool,

    // Lobby
    pub rooms: Vec<RoomSummary>,
    pub selected_room: usize,

    // Game
    pub game: Option<GameSnapshot>,
    /// Keyboard selection on the board.
    pub cursor: Cell,
    pub chat: VecDeque<ChatLine>,
    /// Lines scrolled back from the newest chat line.
    pub chat_scroll: usize,
    pub celebration: Option<Celebration>,

    // Gallery
    pub images: Vec<ImageInfo>,
    pub selected_image: usize,

    /// Probe results by skin URL.
    pub skin_status: HashMap<String, bool>,
    pub prompt: Option<Prompt>,
    pub alert: Option<String>,
    pub notice: Option<(String, Instant)>,
    pub confirm_quit: bool,

    chat_history: usize,
    celebration_duration: Duration,
    pub placeholder_url: String,
    pub render_interval: Duration,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            screen: Screen::Login,
            theme: Theme::Light,
            nickname: String::new(),
            skin_url: None,
            connection_status: ConnectionStatus::Disconnected,
            login_nickname: String::new(),
            login_skin: String::new(),
            login_focus: LoginField::Nickname,
            login_pending: false,
            rooms: Vec::new(),
            selected_room: 0,
            game: None,
            cursor: Cell::new(BOARD_SIZE / 2, BOARD_SIZE / 2),
            chat: VecDeque::new(),
            chat_scroll: 0,
            celebration: None,
            images: Vec::new(),
            selected_image: 0,
            skin_status: HashMap::new(),
            prompt: None,
            alert: None,
            notice: None,
            confirm_quit: false,
            chat_history: 200,
            celebration_duration: Duration::from_secs(2),
            placeholder_url: gomoku_core::config::SkinConfig::default().placeholder_url,
            render_interval: Duration::from_millis(33),
        }
    }
}

impl ViewState {
    pub fn new(config: &Config) -> Self {
        ViewState {
            chat_history: config.ui.chat_history,
            celebration_duration: Duration::from_secs(config.ui.celebration_secs),
            placeholder_url: config.skins.placeholder_url.clone(),
            render_interval: Duration::from_millis(1000 / u64::from(config.ui.render_fps.max(1))),
            ..ViewState::default()
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.theme)
    }

    /// The skin to show for `url`: the URL itself, or the placeholder when a
    /// probe found it unusable.
    pub fn display_skin<'a>(&'a self, url: &'a str) -> &'a str {
        match self.skin_status.get(url) {
            Some(false) => self.placeholder_url.as_str(),
            _ => url,
        }
    }

    pub fn selected_room(&self) -> Option<&RoomSummary> {
        self.rooms.get(self.selected_room)
    }

    pub fn selected_image(&self) -> Option<&ImageInfo> {
        self.images.get(self.selected_image)
    }

    pub fn notice_text(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    /// Drop the celebration and notice once their time is up.
    pub fn expire(&mut self, now: Instant) {
        if self.celebration.as_ref().is_some_and(|c| now >= c.until) {
            self.celebration = None;
        }
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| now.duration_since(*at) >= NOTICE_DURATION)
        {
            self.notice = None;
        }
    }

    fn push_chat(&mut self, line: ChatLine) {
        self.chat.push_back(line);
        while self.chat.len() > self.chat_history.max(1) {
            self.chat.pop_front();
        }
        if self.chat_scroll > 0 {
            self.chat_scroll = (self.chat_scroll + 1).min(self.chat.len().saturating_sub(1));
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Screen(screen) => {
            if screen != state.screen {
                state.prompt = None;
            }
            state.screen = screen;
            state.login_pending = false;
            if screen != Screen::Game {
                state.game = None;
                state.celebration = None;
            }
        }
        UiUpdate::Identity { nickname, skin_url } => {
            if state.login_nickname.is_empty() {
                state.login_nickname = nickname.clone();
            }
            state.nickname = nickname;
            state.skin_url = skin_url;
        }
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
        }
        UiUpdate::Rooms(rooms) => {
            state.rooms = rooms;
            state.selected_room = state.selected_room.min(state.rooms.len().saturating_sub(1));
        }
        UiUpdate::Game(snapshot) => {
            state.game = Some(*snapshot);
        }
        UiUpdate::Chat(line) => state.push_chat(line),
        UiUpdate::ClearChat => {
            state.chat.clear();
            state.chat_scroll = 0;
        }
        UiUpdate::Celebrate { winner_name, .. } => {
            state.celebration = Some(Celebration {
                winner_name,
                until: Instant::now() + state.celebration_duration,
            });
        }
        UiUpdate::Images(images) => {
            state.images = images;
            state.selected_image = state.selected_image.min(state.images.len().saturating_sub(1));
        }
        UiUpdate::SkinChecked { url, ok } => {
            state.skin_status.insert(url, ok);
        }
        UiUpdate::Alert(text) => {
            state.login_pending = false;
            state.alert = Some(text);
        }
        UiUpdate::Notice(text) => {
            state.notice = Some((text, Instant::now()));
        }
        UiUpdate::Theme(theme) => {
            state.theme = theme;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame for the current screen, overlays last.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let area = frame.area();
    let layout = build_layout(area);
    let palette = state.palette();

    frame.render_widget(ratatui::widgets::Block::default().style(palette.base()), area);
    widgets::status_bar::render(frame, layout.status_bar, state);

    match state.screen {
        Screen::Login => widgets::login::render(frame, layout.body, state),
        Screen::Lobby => widgets::lobby::render(frame, layout.body, state),
        Screen::Gallery => widgets::gallery::render(frame, layout.body, state),
        Screen::Game => {
            widgets::board::render(frame, layout.board, state);
            widgets::game_info::render(frame, layout.info, state);
            widgets::chat::render(frame, layout.chat, state);
        }
    }

    if let Some(prompt) = &state.prompt {
        widgets::modal::render_prompt(frame, layout.input, prompt, &palette);
    }
    widgets::help_bar::render(frame, layout.help_bar, state);

    if let Some(celebration) = &state.celebration {
        widgets::celebration::render(frame, area, celebration, &palette);
    }
    if let Some(text) = &state.alert {
        widgets::modal::render_alert(frame, area, text, &palette);
    }
    if state.confirm_quit {
        widgets::modal::render_quit_confirm(frame, area, &palette);
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal and enables mouse capture.
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, terminal input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut event_stream = EventStream::new();
    let mut render_tick = tokio::time::interval(view_state.render_interval);
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App is shutting down
                    None => break Ok(()),
                }
            }

            // Terminal input
            maybe_event = event_stream.next() => {
                let command = match maybe_event {
                    Some(Ok(Event::Key(key_event))) => input::handle_key(key_event, &mut view_state),
                    Some(Ok(Event::Mouse(mouse_event))) => match terminal.size() {
                        Ok(size) => {
                            let area = Rect::new(0, 0, size.width, size.height);
                            input::handle_mouse(mouse_event, &mut view_state, area)
                        }
                        Err(_) => None,
                    },
                    Some(Ok(_)) => None,
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                };
                match command {
                    Some(UserCommand::Quit) => {
                        let _ = cmd_tx.send(UserCommand::Quit).await;
                        break Ok(());
                    }
                    Some(cmd) => {
                        let _ = cmd_tx.send(cmd).await;
                    }
                    None => {}
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                view_state.expire(Instant::now());
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    };

    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
