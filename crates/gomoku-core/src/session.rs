// Client-side game session: who we are, which room we are in, and what the
// server has told us about the game so far.
//
// Broadcasts from the room's two topics are dispatched here and turned into
// `SessionEffect`s for the UI. Local placement requests are gated here before
// anything reaches the network.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{Board, Cell, Placed};
use crate::message::{GameMessage, MessageType, StoneColor, Topic};

/// Sender name the server uses for its own announcements.
pub const SYSTEM_SENDER: &str = "SYSTEM";

/// Length of the generated session identifier.
const SESSION_ID_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    System,
    Player,
}

/// One rendered line of the chat log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub kind: ChatKind,
    pub sender: Option<String>,
    pub text: String,
    pub at: DateTime<Local>,
}

impl ChatLine {
    pub fn system(text: impl Into<String>) -> Self {
        ChatLine {
            kind: ChatKind::System,
            sender: None,
            text: text.into(),
            at: Local::now(),
        }
    }

    pub fn player(sender: impl Into<String>, text: impl Into<String>) -> Self {
        ChatLine {
            kind: ChatKind::Player,
            sender: Some(sender.into()),
            text: text.into(),
            at: Local::now(),
        }
    }
}

/// Someone we have seen in the current room.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub name: String,
    pub color: StoneColor,
    pub skin_url: Option<String>,
}

/// What the UI should do in response to a broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// The server assigned us a seat.
    ColorAssigned(StoneColor),
    StonePlaced { cell: Cell, color: StoneColor },
    BoardReset,
    Chat(ChatLine),
    GameOver {
        winner_name: Option<String>,
        winner_skin: Option<String>,
        winning_line: Option<Vec<Cell>>,
    },
    /// Our own exit was echoed back; the room is gone from our side.
    LeftRoom,
    /// A skin URL appeared that the UI has not necessarily seen before.
    SkinSeen(String),
}

/// Why a placement request never reached the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceRejection {
    #[error("You are not in a room.")]
    NotInRoom,

    #[error("That point is off the board.")]
    OutOfBounds,

    #[error("The game is over. Start a new game to play again.")]
    GameEnded,

    #[error("Spectators cannot place stones.")]
    Spectator,

    #[error("It is {}'s turn.", .turn.label())]
    NotYourTurn { turn: StoneColor },

    #[error("That point is already taken.")]
    Occupied,
}

impl PlaceRejection {
    /// Off-board input is dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, PlaceRejection::OutOfBounds)
    }
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClientSession {
    pub nickname: String,
    pub session_id: String,
    pub skin_url: Option<String>,
    pub room: Option<RoomRef>,
    pub my_color: StoneColor,
    /// Whose move it is, as far as the broadcasts tell us.
    pub turn: StoneColor,
    pub game_ended: bool,
    pub board: Board,
    pub last_move: Option<Cell>,
    pub winning_line: Option<Vec<Cell>>,
    /// Players seen in this room, keyed by sender id.
    pub players: BTreeMap<String, PlayerInfo>,
}

impl ClientSession {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self::with_session_id(nickname, generate_session_id())
    }

    pub fn with_session_id(nickname: impl Into<String>, session_id: impl Into<String>) -> Self {
        ClientSession {
            nickname: nickname.into(),
            session_id: session_id.into(),
            skin_url: None,
            room: None,
            my_color: StoneColor::None,
            turn: StoneColor::Black,
            game_ended: false,
            board: Board::new(),
            last_move: None,
            winning_line: None,
            players: BTreeMap::new(),
        }
    }

    fn reset_room_state(&mut self) {
        self.my_color = StoneColor::None;
        self.turn = StoneColor::Black;
        self.game_ended = false;
        self.board.clear();
        self.last_move = None;
        self.winning_line = None;
        self.players.clear();
    }

    /// Switch to `room` with a fresh board and no seat.
    pub fn enter_room(&mut self, room: RoomRef) {
        info!("Entering room {} ({})", room.name, room.id);
        self.reset_room_state();
        self.room = Some(room);
    }

    pub fn leave_room(&mut self) {
        if let Some(room) = self.room.take() {
            info!("Leaving room {} ({})", room.name, room.id);
        }
        self.reset_room_state();
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room.as_ref().map(|r| r.id.as_str())
    }

    fn skin(&self) -> Option<&str> {
        self.skin_url.as_deref()
    }

    // --- outbound -----------------------------------------------------------

    pub fn join_message(&self) -> GameMessage {
        GameMessage::join(&self.nickname, &self.session_id, self.skin())
    }

    /// Chat message for `text`, or `None` if it is blank.
    pub fn chat_message(&self, text: &str) -> Option<GameMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(GameMessage::chat(&self.nickname, &self.session_id, text))
    }

    pub fn start_message(&self) -> GameMessage {
        GameMessage::start(&self.nickname)
    }

    pub fn exit_message(&self) -> GameMessage {
        GameMessage::exit(&self.nickname, &self.session_id)
    }

    /// Check whether we may place a stone at `cell` and build the message
    /// to publish if so.
    ///
    /// `None` means the pointer mapped outside the board. The mirror is not
    /// touched; the stone appears when the server broadcasts it.
    pub fn request_stone(&self, cell: Option<Cell>) -> Result<GameMessage, PlaceRejection> {
        let cell = cell.ok_or(PlaceRejection::OutOfBounds)?;
        if self.room.is_none() {
            return Err(PlaceRejection::NotInRoom);
        }
        if self.game_ended {
            return Err(PlaceRejection::GameEnded);
        }
        if !self.my_color.is_player() {
            return Err(PlaceRejection::Spectator);
        }
        if self.my_color != self.turn {
            return Err(PlaceRejection::NotYourTurn { turn: self.turn });
        }
        if !self.board.is_empty_at(cell) {
            return Err(PlaceRejection::Occupied);
        }
        Ok(GameMessage::stone(
            &self.nickname,
            &self.session_id,
            cell,
            self.my_color,
            self.skin(),
        ))
    }

    // --- inbound ------------------------------------------------------------

    /// Decode and dispatch a broadcast body from `topic`.
    pub fn handle(&mut self, topic: Topic, body: &str) -> Result<Vec<SessionEffect>, serde_json::Error> {
        let msg: GameMessage = serde_json::from_str(body)?;
        Ok(match topic {
            Topic::Stone => self.handle_stone(msg),
            Topic::Chat => self.handle_chat(msg),
        })
    }

    /// A stone was accepted by the server: mirror it and pass the turn.
    pub fn handle_stone(&mut self, msg: GameMessage) -> Vec<SessionEffect> {
        let Some(cell) = msg.cell() else {
            warn!("stone broadcast without a valid position: {:?}", msg);
            return Vec::new();
        };
        let color = msg.stone_type.unwrap_or_default();
        let skin = msg.skin().map(str::to_string);
        let mut effects = Vec::new();

        self.board.place(
            cell,
            Placed {
                color,
                skin_url: skin.clone(),
            },
        );
        self.last_move = Some(cell);
        if color.is_player() {
            self.turn = color.opponent();
        }
        debug!("stone {:?} at {:?}, turn now {:?}", color, cell, self.turn);

        if let (Some(id), Some(name)) = (msg.sender_id.as_ref(), msg.sender.as_ref()) {
            self.players.insert(
                id.clone(),
                PlayerInfo {
                    name: name.clone(),
                    color,
                    skin_url: skin.clone(),
                },
            );
        }

        effects.push(SessionEffect::StonePlaced { cell, color });
        if let Some(url) = skin {
            effects.push(SessionEffect::SkinSeen(url));
        }
        effects
    }

    /// Dispatch a chat-topic message.
    ///
    /// A seat assignment addressed to us is applied first; then exactly one
    /// of the start, game-over, exit or chat behaviours runs.
    pub fn handle_chat(&mut self, msg: GameMessage) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        let from_me = msg.sender_id.as_deref() == Some(self.session_id.as_str());

        // Messages are echoed with stoneType 0 when it carries no meaning, so
        // only a real seat counts as an assignment.
        if let Some(color) = msg.stone_type.filter(|c| c.is_player()) {
            if from_me {
                info!("Assigned {:?}", color);
                self.my_color = color;
                effects.push(SessionEffect::ColorAssigned(color));
            }
        }

        if msg.kind == Some(MessageType::Join) {
            if let (Some(id), Some(name)) = (msg.sender_id.as_ref(), msg.sender.as_ref()) {
                self.players.insert(
                    id.clone(),
                    PlayerInfo {
                        name: name.clone(),
                        color: msg.stone_type.unwrap_or_default(),
                        skin_url: msg.skin().map(str::to_string),
                    },
                );
            }
            if let Some(url) = msg.skin() {
                effects.push(SessionEffect::SkinSeen(url.to_string()));
            }
        }

        let content = msg.content.clone().unwrap_or_default();
        match msg.kind {
            Some(MessageType::Start) => {
                self.game_ended = false;
                self.board.clear();
                self.turn = StoneColor::Black;
                self.last_move = None;
                self.winning_line = None;
                effects.push(SessionEffect::BoardReset);
                effects.push(SessionEffect::Chat(ChatLine::system("Game started!")));
            }
            Some(MessageType::GameOver) => {
                self.game_ended = true;
                self.winning_line = self.last_move.and_then(|cell| self.board.five_in_row(cell));
                effects.push(SessionEffect::GameOver {
                    winner_name: msg.winner_name.clone(),
                    winner_skin: msg.winner_skin.clone(),
                    winning_line: self.winning_line.clone(),
                });
                effects.push(SessionEffect::Chat(ChatLine::system(content)));
            }
            Some(MessageType::Exit) => {
                if from_me {
                    self.leave_room();
                    effects.push(SessionEffect::LeftRoom);
                } else {
                    if let Some(id) = msg.sender_id.as_ref() {
                        self.players.remove(id);
                    }
                    effects.push(SessionEffect::Chat(ChatLine::system(content)));
                }
            }
            _ => {
                let line = match msg.sender.as_deref() {
                    None | Some(SYSTEM_SENDER) => ChatLine::system(content),
                    Some(sender) => ChatLine::player(sender, content),
                };
                effects.push(SessionEffect::Chat(line));
            }
        }
        effects
    }
}

/// Random lowercase base-36 identifier, unique enough to tell the clients in
/// one room apart.
pub fn generate_session_id() -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
