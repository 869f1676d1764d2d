// Application state and orchestration logic.
//
// The central event loop that coordinates room broadcasts from the STOMP
// connection, results of background HTTP calls, and user commands from the
// TUI. Owns the client session and pushes UI updates to the TUI render loop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use gomoku_core::api::GameApi;
use gomoku_core::config::Config;
use gomoku_core::message::{Action, GameMessage};
use gomoku_core::prefs::Preferences;
use gomoku_core::session::{ClientSession, RoomRef, SessionEffect};
use gomoku_core::transport::{Broker, RoomLink, TransportEvent};

use crate::protocol::{ApiEvent, ConnectionStatus, GameSnapshot, Screen, UiUpdate, UserCommand};

/// Capacity of each room connection's event queue.
const TRANSPORT_CAPACITY: usize = 256;

const NOT_CONNECTED: &str = "Not connected to the room.";

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub session: ClientSession,
    pub screen: Screen,
    pub prefs: Preferences,
    /// Where preferences are saved. `None` keeps them in memory only.
    pub prefs_path: Option<PathBuf>,
    pub connection: Option<Box<dyn RoomLink>>,
    pub connection_status: ConnectionStatus,
    /// Identifies the current connect attempt. Events and results tagged with
    /// any other generation belong to a connection we already abandoned.
    pub connect_generation: u64,
    /// Skin URLs already probed, with the outcome.
    pub checked_skins: HashMap<String, bool>,
    api: Arc<dyn GameApi>,
    broker: Arc<dyn Broker>,
    api_tx: mpsc::Sender<ApiEvent>,
    transport_tx: mpsc::Sender<(u64, TransportEvent)>,
}

impl AppState {
    pub fn new(
        config: Config,
        prefs: Preferences,
        prefs_path: Option<PathBuf>,
        api: Arc<dyn GameApi>,
        broker: Arc<dyn Broker>,
        api_tx: mpsc::Sender<ApiEvent>,
        transport_tx: mpsc::Sender<(u64, TransportEvent)>,
    ) -> Self {
        let session = ClientSession::new(prefs.nickname.clone().unwrap_or_default());
        info!("Session id {}", session.session_id);
        AppState {
            config,
            session,
            screen: Screen::Login,
            prefs,
            prefs_path,
            connection: None,
            connection_status: ConnectionStatus::Disconnected,
            connect_generation: 0,
            checked_skins: HashMap::new(),
            api,
            broker,
            api_tx,
            transport_tx,
        }
    }

    fn save_prefs(&self) {
        if let Some(path) = &self.prefs_path {
            if let Err(e) = self.prefs.save_to(path) {
                warn!("Failed to save preferences: {e}");
            }
        }
    }

    fn identity(&self) -> UiUpdate {
        UiUpdate::Identity {
            nickname: self.session.nickname.clone(),
            skin_url: self.session.skin_url.clone(),
        }
    }

    fn game_update(&self) -> Option<UiUpdate> {
        GameSnapshot::from_session(&self.session).map(|s| UiUpdate::Game(Box::new(s)))
    }

    // --- background tasks ---------------------------------------------------

    fn spawn_list_rooms(&self) {
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(ApiEvent::Rooms(api.list_rooms().await)).await;
        });
    }

    fn spawn_create_room(&self, name: String) {
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(ApiEvent::RoomCreated(api.create_room(&name).await)).await;
        });
    }

    fn spawn_upload_skin(&self, path: PathBuf) {
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(ApiEvent::SkinUploaded(api.upload_skin(&path).await)).await;
        });
    }

    fn spawn_list_images(&self) {
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        let username = self.session.nickname.clone();
        tokio::spawn(async move {
            let _ = tx.send(ApiEvent::Images(api.list_images(&username).await)).await;
        });
    }

    fn spawn_gallery_change(&self, change: GalleryChange) {
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        let username = self.session.nickname.clone();
        tokio::spawn(async move {
            let (action, result) = match change {
                GalleryChange::Star(id) => ("star", api.star_image(id).await),
                GalleryChange::Delete(id) => ("delete", api.delete_image(id).await),
                GalleryChange::Upload(path) => ("upload", api.upload_image(&username, &path).await),
                GalleryChange::Link(url) => ("link", api.link_image(&username, &url).await),
            };
            let _ = tx.send(ApiEvent::GalleryChanged { action, result }).await;
        });
    }

    /// Check a skin URL once. Without probing every skin counts as loadable.
    fn probe_skin(&mut self, url: String) -> Option<UiUpdate> {
        if self.checked_skins.contains_key(&url) {
            return None;
        }
        if !self.config.skins.probe {
            self.checked_skins.insert(url.clone(), true);
            return Some(UiUpdate::SkinChecked { url, ok: true });
        }
        // Marked optimistic until the probe answers, so it is not re-sent.
        self.checked_skins.insert(url.clone(), true);
        let api = self.api.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let ok = api.probe_image(&url).await;
            let _ = tx.send(ApiEvent::SkinProbed { url, ok }).await;
        });
        None
    }

    /// Start connecting to `room`. The outcome arrives as
    /// `ApiEvent::RoomJoined`.
    fn spawn_connect(&mut self, room_id: String) -> u64 {
        self.connect_generation += 1;
        let generation = self.connect_generation;
        let broker = self.broker.clone();
        let api_tx = self.api_tx.clone();
        let transport_tx = self.transport_tx.clone();
        tokio::spawn(async move {
            let (events_tx, mut events_rx) = mpsc::channel(TRANSPORT_CAPACITY);
            let result = broker.join(&room_id, events_tx).await;
            if result.is_ok() {
                tokio::spawn(async move {
                    while let Some(event) = events_rx.recv().await {
                        if transport_tx.send((generation, event)).await.is_err() {
                            break;
                        }
                    }
                });
            }
            let _ = api_tx.send(ApiEvent::RoomJoined { generation, result }).await;
        });
        generation
    }
}

/// A gallery mutation run in the background.
#[derive(Debug, Clone, PartialEq)]
enum GalleryChange {
    Star(i64),
    Delete(i64),
    Upload(PathBuf),
    Link(String),
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on three channels using `tokio::select!`:
/// 1. Room broadcasts, tagged with the connect generation
/// 2. Results of background HTTP and connect tasks
/// 3. User commands from the TUI
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut transport_rx: mpsc::Receiver<(u64, TransportEvent)>,
    mut api_rx: mpsc::Receiver<ApiEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let _ = ui_tx.send(UiUpdate::Theme(state.prefs.theme)).await;
    let _ = ui_tx.send(state.identity()).await;
    let _ = ui_tx.send(UiUpdate::Screen(state.screen)).await;

    loop {
        tokio::select! {
            // --- Room broadcasts ---
            event = transport_rx.recv() => {
                match event {
                    Some((generation, event)) if generation == state.connect_generation => {
                        handle_transport_event(&mut state, event, &ui_tx).await;
                    }
                    Some((generation, event)) => {
                        debug!("dropping event from stale connection {generation}: {event:?}");
                    }
                    None => {
                        info!("Transport channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Background task results ---
            event = api_rx.recv() => {
                match event {
                    Some(event) => handle_api_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("API channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    if state.connection.is_some() {
        let exit = state.session.exit_message();
        publish(&state, Action::Exit, &exit, &ui_tx).await;
        close_connection(&mut state).await;
    }
    info!("Application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Handle a user command from the TUI.
async fn handle_user_command(state: &mut AppState, cmd: UserCommand, ui_tx: &mpsc::Sender<UiUpdate>) {
    match cmd {
        UserCommand::Login { nickname, skin_path } => {
            let nickname = nickname.trim().to_string();
            if nickname.is_empty() {
                let _ = ui_tx.send(UiUpdate::Alert("Enter a nickname.".into())).await;
                return;
            }
            info!("Logged in as {nickname}");
            state.session.nickname = nickname.clone();
            state.prefs.nickname = Some(nickname);
            state.save_prefs();
            let _ = ui_tx.send(state.identity()).await;

            match skin_path.filter(|p| !p.as_os_str().is_empty()) {
                Some(path) => {
                    info!("Uploading skin {}", path.display());
                    let _ = ui_tx.send(UiUpdate::Notice("Uploading skin...".into())).await;
                    state.spawn_upload_skin(path);
                }
                None => enter_lobby(state, ui_tx).await,
            }
        }
        UserCommand::RefreshRooms => state.spawn_list_rooms(),
        UserCommand::CreateRoom(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                let _ = ui_tx.send(UiUpdate::Alert("Enter a room name.".into())).await;
                return;
            }
            info!("Creating room {name}");
            state.spawn_create_room(name);
        }
        UserCommand::JoinRoom { room_id, room_name } => {
            join_room(state, room_id, room_name, ui_tx).await;
        }
        UserCommand::PlaceStone(cell) => match state.session.request_stone(cell) {
            Ok(msg) => {
                debug!("requesting stone at {:?}", cell);
                publish(state, Action::Stone, &msg, ui_tx).await;
            }
            Err(rejection) if rejection.is_silent() => {
                debug!("ignoring placement: {rejection}");
            }
            Err(rejection) => {
                let _ = ui_tx.send(UiUpdate::Notice(rejection.to_string())).await;
            }
        },
        UserCommand::SendChat(text) => {
            if let Some(msg) = state.session.chat_message(&text) {
                publish(state, Action::Chat, &msg, ui_tx).await;
            }
        }
        UserCommand::StartGame => {
            if state.session.room.is_some() {
                let msg = state.session.start_message();
                publish(state, Action::Start, &msg, ui_tx).await;
            }
        }
        UserCommand::ExitRoom => {
            if state.connection.is_some() {
                let msg = state.session.exit_message();
                publish(state, Action::Exit, &msg, ui_tx).await;
            }
            return_to_lobby(state, ui_tx).await;
        }
        UserCommand::OpenGallery => {
            state.screen = Screen::Gallery;
            let _ = ui_tx.send(UiUpdate::Screen(Screen::Gallery)).await;
            state.spawn_list_images();
        }
        UserCommand::CloseGallery => {
            state.screen = Screen::Lobby;
            let _ = ui_tx.send(UiUpdate::Screen(Screen::Lobby)).await;
        }
        UserCommand::StarImage(id) => state.spawn_gallery_change(GalleryChange::Star(id)),
        UserCommand::DeleteImage(id) => state.spawn_gallery_change(GalleryChange::Delete(id)),
        UserCommand::UploadImage(path) => {
            if path.as_os_str().is_empty() {
                let _ = ui_tx.send(UiUpdate::Alert("Enter a file path.".into())).await;
                return;
            }
            state.spawn_gallery_change(GalleryChange::Upload(path));
        }
        UserCommand::LinkImage(url) => {
            let url = url.trim().to_string();
            if url.is_empty() {
                let _ = ui_tx.send(UiUpdate::Alert("Enter an image URL.".into())).await;
                return;
            }
            state.spawn_gallery_change(GalleryChange::Link(url));
        }
        UserCommand::UseSkin(url) => {
            info!("Using skin {url}");
            state.session.skin_url = Some(url.clone());
            let _ = ui_tx.send(state.identity()).await;
            let _ = ui_tx.send(UiUpdate::Notice("Skin updated.".into())).await;
            if let Some(update) = state.probe_skin(url) {
                let _ = ui_tx.send(update).await;
            }
        }
        UserCommand::ToggleTheme => {
            state.prefs.theme = state.prefs.theme.toggled();
            state.save_prefs();
            let _ = ui_tx.send(UiUpdate::Theme(state.prefs.theme)).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Handle the result of a background task.
async fn handle_api_event(state: &mut AppState, event: ApiEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    match event {
        ApiEvent::SkinUploaded(Ok(url)) => {
            info!("Skin uploaded to {url}");
            state.session.skin_url = Some(url.clone());
            let _ = ui_tx.send(state.identity()).await;
            if let Some(update) = state.probe_skin(url) {
                let _ = ui_tx.send(update).await;
            }
            enter_lobby(state, ui_tx).await;
        }
        ApiEvent::SkinUploaded(Err(e)) => {
            warn!("Skin upload failed: {e}");
            let _ = ui_tx
                .send(UiUpdate::Alert("Skin upload failed. Using the default skin.".into()))
                .await;
            enter_lobby(state, ui_tx).await;
        }
        ApiEvent::Rooms(Ok(rooms)) => {
            debug!("{} rooms listed", rooms.len());
            let _ = ui_tx.send(UiUpdate::Rooms(rooms)).await;
        }
        ApiEvent::Rooms(Err(e)) => {
            warn!("Failed to list rooms: {e}");
            let _ = ui_tx.send(UiUpdate::Notice("Could not load the room list.".into())).await;
        }
        ApiEvent::RoomCreated(Ok(room)) => {
            info!("Created room {} ({})", room.room_name, room.room_id);
            join_room(state, room.room_id, room.room_name, ui_tx).await;
        }
        ApiEvent::RoomCreated(Err(e)) => {
            warn!("Failed to create room: {e}");
            let _ = ui_tx.send(UiUpdate::Alert("Could not create the room.".into())).await;
        }
        ApiEvent::Images(Ok(images)) => {
            let _ = ui_tx.send(UiUpdate::Images(images)).await;
        }
        ApiEvent::Images(Err(e)) => {
            warn!("Failed to list images: {e}");
            let _ = ui_tx.send(UiUpdate::Alert("Could not load your images.".into())).await;
        }
        ApiEvent::GalleryChanged { action, result } => {
            if let Err(e) = result {
                warn!("Gallery {action} failed: {e}");
                let _ = ui_tx
                    .send(UiUpdate::Alert(format!("Image {action} failed.")))
                    .await;
            }
            state.spawn_list_images();
        }
        ApiEvent::SkinProbed { url, ok } => {
            if !ok {
                info!("Skin {url} is not loadable, using placeholder");
            }
            state.checked_skins.insert(url.clone(), ok);
            let _ = ui_tx.send(UiUpdate::SkinChecked { url, ok }).await;
        }
        ApiEvent::RoomJoined { generation, result } => {
            if generation != state.connect_generation {
                debug!("discarding stale connect result {generation}");
                if let Ok(mut link) = result {
                    link.close().await;
                }
                return;
            }
            match result {
                Ok(link) => {
                    info!("Connected to room");
                    state.connection = Some(link);
                    state.connection_status = ConnectionStatus::Connected;
                    let _ = ui_tx
                        .send(UiUpdate::ConnectionStatus(ConnectionStatus::Connected))
                        .await;
                    let join = state.session.join_message();
                    publish(state, Action::Join, &join, ui_tx).await;
                }
                Err(e) => {
                    warn!("Failed to connect to room: {e}");
                    state.session.leave_room();
                    set_status(state, ConnectionStatus::Disconnected, ui_tx).await;
                    let _ = ui_tx
                        .send(UiUpdate::Alert(format!("Could not connect to the room: {e}")))
                        .await;
                    enter_lobby(state, ui_tx).await;
                }
            }
        }
    }
}

/// Handle an event from the current room connection.
async fn handle_transport_event(state: &mut AppState, event: TransportEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    match event {
        TransportEvent::Message { topic, body } => match state.session.handle(topic, &body) {
            Ok(effects) => apply_effects(state, effects, ui_tx).await,
            Err(e) => warn!("Undecodable {topic:?} broadcast: {e}"),
        },
        TransportEvent::BrokerError(reason) => {
            warn!("Broker error: {reason}");
            let _ = ui_tx.send(UiUpdate::Notice(format!("Server error: {reason}"))).await;
        }
        TransportEvent::Disconnected => {
            info!("Room connection lost");
            state.connection = None;
            set_status(state, ConnectionStatus::Disconnected, ui_tx).await;
            let _ = ui_tx.send(UiUpdate::Notice("Disconnected from the room.".into())).await;
        }
    }
}

/// Render the effects of one dispatched broadcast.
async fn apply_effects(state: &mut AppState, effects: Vec<SessionEffect>, ui_tx: &mpsc::Sender<UiUpdate>) {
    for effect in effects {
        match effect {
            SessionEffect::ColorAssigned(color) => {
                info!("Playing as {}", color.label());
            }
            SessionEffect::StonePlaced { .. } | SessionEffect::BoardReset => {}
            SessionEffect::Chat(line) => {
                let _ = ui_tx.send(UiUpdate::Chat(line)).await;
            }
            SessionEffect::GameOver {
                winner_name,
                winner_skin,
                ..
            } => {
                info!("Game over, winner {:?}", winner_name);
                let _ = ui_tx.send(UiUpdate::Celebrate { winner_name, winner_skin }).await;
            }
            SessionEffect::LeftRoom => {
                return_to_lobby(state, ui_tx).await;
                return;
            }
            SessionEffect::SkinSeen(url) => {
                if let Some(update) = state.probe_skin(url) {
                    let _ = ui_tx.send(update).await;
                }
            }
        }
    }
    if let Some(update) = state.game_update() {
        let _ = ui_tx.send(update).await;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn enter_lobby(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.screen = Screen::Lobby;
    let _ = ui_tx.send(UiUpdate::Screen(Screen::Lobby)).await;
    state.spawn_list_rooms();
}

async fn join_room(state: &mut AppState, room_id: String, room_name: String, ui_tx: &mpsc::Sender<UiUpdate>) {
    close_connection(state).await;
    state.session.enter_room(RoomRef {
        id: room_id.clone(),
        name: room_name,
    });
    state.screen = Screen::Game;
    let _ = ui_tx.send(UiUpdate::ClearChat).await;
    let _ = ui_tx.send(UiUpdate::Screen(Screen::Game)).await;
    if let Some(update) = state.game_update() {
        let _ = ui_tx.send(update).await;
    }
    set_status(state, ConnectionStatus::Connecting, ui_tx).await;
    state.spawn_connect(room_id);
}

/// Drop the room and go back to the lobby.
async fn return_to_lobby(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    close_connection(state).await;
    // Abandon any connect still in flight.
    state.connect_generation += 1;
    state.session.leave_room();
    set_status(state, ConnectionStatus::Disconnected, ui_tx).await;
    let _ = ui_tx.send(UiUpdate::ClearChat).await;
    enter_lobby(state, ui_tx).await;
}

async fn close_connection(state: &mut AppState) {
    if let Some(mut link) = state.connection.take() {
        link.close().await;
    }
}

async fn set_status(state: &mut AppState, status: ConnectionStatus, ui_tx: &mpsc::Sender<UiUpdate>) {
    if state.connection_status != status {
        state.connection_status = status;
        let _ = ui_tx.send(UiUpdate::ConnectionStatus(status)).await;
    }
}

/// Publish to the current room, warning the user if there is no connection.
async fn publish(state: &AppState, action: Action, msg: &GameMessage, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(link) = state.connection.as_ref() else {
        let _ = ui_tx.send(UiUpdate::Notice(NOT_CONNECTED.into())).await;
        return;
    };
    if let Err(e) = link.publish(action, msg).await {
        warn!("Failed to publish {action:?}: {e}");
        let _ = ui_tx.send(UiUpdate::Notice(NOT_CONNECTED.into())).await;
    }
}

/// Preferences file location, or `None` when the platform has no config
/// directory.
pub fn default_prefs_path() -> Option<PathBuf> {
    match Preferences::default_path() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Preferences will not be saved: {e}");
            None
        }
    }
}

/// Load preferences from `path`, or defaults when there is none.
pub fn load_prefs(path: Option<&Path>) -> Preferences {
    path.map(Preferences::load_from).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
