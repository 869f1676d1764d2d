// Messages exchanged between the app orchestrator, its background tasks and
// the TUI.

use std::path::PathBuf;

use gomoku_core::api::ApiError;
use gomoku_core::board::{Board, Cell};
use gomoku_core::message::{ImageInfo, RoomSummary, StoneColor};
use gomoku_core::prefs::Theme;
use gomoku_core::session::{ChatLine, ClientSession, PlayerInfo, RoomRef};
use gomoku_core::transport::{RoomLink, TransportError};

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// Which screen the client is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Lobby,
    Game,
    Gallery,
}

/// State of the room connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Login {
        nickname: String,
        skin_path: Option<PathBuf>,
    },
    RefreshRooms,
    CreateRoom(String),
    JoinRoom {
        room_id: String,
        room_name: String,
    },
    /// A board selection; `None` when the pointer was off the grid.
    PlaceStone(Option<Cell>),
    SendChat(String),
    StartGame,
    ExitRoom,
    OpenGallery,
    CloseGallery,
    StarImage(i64),
    DeleteImage(i64),
    UploadImage(PathBuf),
    LinkImage(String),
    /// Use a gallery image as our skin from now on.
    UseSkin(String),
    ToggleTheme,
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

/// Everything the game screen needs to draw, copied out of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub room: RoomRef,
    pub my_color: StoneColor,
    pub turn: StoneColor,
    pub game_ended: bool,
    pub board: Board,
    pub last_move: Option<Cell>,
    pub winning_line: Option<Vec<Cell>>,
    pub players: Vec<PlayerInfo>,
}

impl GameSnapshot {
    /// `None` when the session is not in a room.
    pub fn from_session(session: &ClientSession) -> Option<Self> {
        let room = session.room.clone()?;
        Some(GameSnapshot {
            room,
            my_color: session.my_color,
            turn: session.turn,
            game_ended: session.game_ended,
            board: session.board.clone(),
            last_move: session.last_move,
            winning_line: session.winning_line.clone(),
            players: session.players.values().cloned().collect(),
        })
    }
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Screen(Screen),
    Identity {
        nickname: String,
        skin_url: Option<String>,
    },
    ConnectionStatus(ConnectionStatus),
    Rooms(Vec<RoomSummary>),
    Game(Box<GameSnapshot>),
    Chat(ChatLine),
    ClearChat,
    /// Show the victory celebration.
    Celebrate {
        winner_name: Option<String>,
        winner_skin: Option<String>,
    },
    Images(Vec<ImageInfo>),
    /// Result of probing a skin URL.
    SkinChecked {
        url: String,
        ok: bool,
    },
    /// Modal message the user must dismiss.
    Alert(String),
    /// Transient warning shown in the status bar.
    Notice(String),
    Theme(Theme),
}

// ---------------------------------------------------------------------------
// Background tasks -> app
// ---------------------------------------------------------------------------

/// Results of spawned HTTP and connect tasks.
pub enum ApiEvent {
    SkinUploaded(Result<String, ApiError>),
    Rooms(Result<Vec<RoomSummary>, ApiError>),
    RoomCreated(Result<RoomSummary, ApiError>),
    Images(Result<Vec<ImageInfo>, ApiError>),
    /// A gallery mutation finished; `action` names it for the log.
    GalleryChanged {
        action: &'static str,
        result: Result<(), ApiError>,
    },
    SkinProbed {
        url: String,
        ok: bool,
    },
    /// A room connection attempt finished. `generation` identifies the
    /// attempt so a stale result can be discarded.
    RoomJoined {
        generation: u64,
        result: Result<Box<dyn RoomLink>, TransportError>,
    },
}

impl std::fmt::Debug for ApiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiEvent::SkinUploaded(r) => f.debug_tuple("SkinUploaded").field(r).finish(),
            ApiEvent::Rooms(r) => f.debug_tuple("Rooms").field(r).finish(),
            ApiEvent::RoomCreated(r) => f.debug_tuple("RoomCreated").field(r).finish(),
            ApiEvent::Images(r) => f.debug_tuple("Images").field(r).finish(),
            ApiEvent::GalleryChanged { action, result } => f
                .debug_struct("GalleryChanged")
                .field("action", action)
                .field("result", result)
                .finish(),
            ApiEvent::SkinProbed { url, ok } => f
                .debug_struct("SkinProbed")
                .field("url", url)
                .field("ok", ok)
                .finish(),
            ApiEvent::RoomJoined { generation, result } => f
                .debug_struct("RoomJoined")
                .field("generation", generation)
                .field("ok", &result.is_ok())
                .finish(),
        }
    }
}
