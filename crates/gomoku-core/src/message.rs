// Wire types shared with the game server: STOMP message bodies, destination
// names, and the JSON shapes returned by the HTTP API.

use serde::{Deserialize, Serialize};

use crate::board::Cell;

// ---------------------------------------------------------------------------
// StoneColor
// ---------------------------------------------------------------------------

/// Seat assigned by the server. Encoded on the wire as 0 (spectator),
/// 1 (black) or 2 (white).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StoneColor {
    #[default]
    None,
    Black,
    White,
}

impl StoneColor {
    pub fn opponent(self) -> StoneColor {
        match self {
            StoneColor::Black => StoneColor::White,
            StoneColor::White => StoneColor::Black,
            StoneColor::None => StoneColor::None,
        }
    }

    pub fn is_player(self) -> bool {
        self != StoneColor::None
    }

    pub fn label(self) -> &'static str {
        match self {
            StoneColor::None => "Spectator",
            StoneColor::Black => "Black",
            StoneColor::White => "White",
        }
    }
}

impl From<StoneColor> for u8 {
    fn from(color: StoneColor) -> u8 {
        match color {
            StoneColor::None => 0,
            StoneColor::Black => 1,
            StoneColor::White => 2,
        }
    }
}

impl TryFrom<u8> for StoneColor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StoneColor::None),
            1 => Ok(StoneColor::Black),
            2 => Ok(StoneColor::White),
            other => Err(format!("invalid stoneType {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// GameMessage
// ---------------------------------------------------------------------------

/// The `type` tag carried by chat-topic messages.
///
/// Anything the client does not recognise decodes as `Other` and is shown as
/// an ordinary chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Join,
    Start,
    GameOver,
    Exit,
    Stone,
    Chat,
    #[serde(other)]
    Other,
}

/// JSON body of every published and received STOMP message.
///
/// Each publish only fills the fields it needs; absent fields are omitted
/// from the serialized object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone_type: Option<StoneColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_skin: Option<String>,
}

impl GameMessage {
    /// Announce ourselves to the room, carrying the chosen skin.
    pub fn join(sender: &str, sender_id: &str, skin_url: Option<&str>) -> Self {
        GameMessage {
            kind: Some(MessageType::Join),
            sender: Some(sender.to_string()),
            sender_id: Some(sender_id.to_string()),
            skin_url: Some(skin_url.unwrap_or_default().to_string()),
            ..Default::default()
        }
    }

    pub fn stone(
        sender: &str,
        sender_id: &str,
        cell: Cell,
        color: StoneColor,
        skin_url: Option<&str>,
    ) -> Self {
        GameMessage {
            sender: Some(sender.to_string()),
            sender_id: Some(sender_id.to_string()),
            row: Some(cell.row as i64),
            col: Some(cell.col as i64),
            stone_type: Some(color),
            skin_url: Some(skin_url.unwrap_or_default().to_string()),
            ..Default::default()
        }
    }

    pub fn chat(sender: &str, sender_id: &str, content: &str) -> Self {
        GameMessage {
            sender: Some(sender.to_string()),
            sender_id: Some(sender_id.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn start(sender: &str) -> Self {
        GameMessage {
            sender: Some(sender.to_string()),
            ..Default::default()
        }
    }

    pub fn exit(sender: &str, sender_id: &str) -> Self {
        GameMessage {
            sender: Some(sender.to_string()),
            sender_id: Some(sender_id.to_string()),
            ..Default::default()
        }
    }

    /// The board intersection named by `row`/`col`, if both are present and
    /// on the board.
    pub fn cell(&self) -> Option<Cell> {
        Cell::checked(self.row?, self.col?)
    }

    /// Non-empty skin URL, treating `""` the same as absent.
    pub fn skin(&self) -> Option<&str> {
        self.skin_url.as_deref().filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

/// Application destinations the client publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Join,
    Stone,
    Chat,
    Start,
    Exit,
}

impl Action {
    fn segment(self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::Stone => "stone",
            Action::Chat => "chat",
            Action::Start => "start",
            Action::Exit => "exit",
        }
    }
}

/// `/app/{roomId}/{action}`
pub fn app_destination(room_id: &str, action: Action) -> String {
    format!("/app/{room_id}/{}", action.segment())
}

/// Broadcast topics the client subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Stone,
    Chat,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Stone, Topic::Chat];

    /// `/topic/{roomId}/{stone|chat}`
    pub fn destination(self, room_id: &str) -> String {
        match self {
            Topic::Stone => format!("/topic/{room_id}/stone"),
            Topic::Chat => format!("/topic/{room_id}/chat"),
        }
    }

    /// Identify which topic a `MESSAGE` frame's destination belongs to.
    pub fn from_destination(destination: &str) -> Option<Topic> {
        if destination.ends_with("/stone") {
            Some(Topic::Stone)
        } else if destination.ends_with("/chat") {
            Some(Topic::Chat)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP API shapes
// ---------------------------------------------------------------------------

/// A room as listed by `GET /api/rooms`.
///
/// The server returns its whole room object; only the fields the lobby shows
/// are decoded and the rest are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub room_name: String,
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub users: Vec<serde_json::Value>,
}

impl RoomSummary {
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

/// An image in the user's gallery.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub original_name: Option<String>,
}

impl ImageInfo {
    /// Short name for list display: the original file name if known,
    /// otherwise the last path segment of the URL.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.original_name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        self.url
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(self.url.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
