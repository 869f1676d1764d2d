// STOMP 1.2 frame encoding and decoding.
//
// The game server speaks STOMP over a WebSocket, one frame per text message.
// Only the frames the client needs are modelled: CONNECT, SUBSCRIBE, SEND and
// DISCONNECT outbound; CONNECTED, MESSAGE, RECEIPT and ERROR inbound.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("malformed header line `{0}`")]
    MalformedHeader(String),

    #[error("invalid escape sequence `\\{0}` in header")]
    InvalidEscape(char),

    #[error("frame is missing its NUL terminator")]
    Unterminated,

    #[error("content-length {declared} exceeds body of {available} bytes")]
    ContentLength { declared: usize, available: usize },

    #[error("frame body is not valid UTF-8")]
    NotUtf8,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn parse(s: &str) -> Result<Self, FrameError> {
        Ok(match s {
            "CONNECT" | "STOMP" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "SEND" => Command::Send,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => return Err(FrameError::UnknownCommand(other.to_string())),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A single STOMP frame. Headers keep their wire order; lookups return the
/// first occurrence, as the protocol requires for repeated headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Result of decoding one WebSocket text payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A bare EOL sent as a heart-beat.
    Heartbeat,
    Frame(Frame),
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Frame {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `CONNECT` for the given virtual host with heart-beating disabled.
    pub fn connect(host: &str) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", "1.1,1.2")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    /// `SEND` with a JSON body.
    pub fn send_json(destination: &str, body: String) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .with_body(body)
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    /// Serialize to wire form, including the trailing NUL.
    ///
    /// `CONNECT`/`CONNECTED` headers are written raw; every other frame gets
    /// 1.2 header escaping.
    pub fn encode(&self) -> String {
        let escape_headers = !matches!(self.command, Command::Connect | Command::Connected);
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (k, v) in &self.headers {
            if escape_headers {
                out.push_str(&escape(k));
                out.push(':');
                out.push_str(&escape(v));
            } else {
                out.push_str(k);
                out.push(':');
                out.push_str(v);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decode one frame from a WebSocket text payload.
    pub fn decode(raw: &str) -> Result<Incoming, FrameError> {
        let trimmed = raw.trim_start_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return if raw.is_empty() {
                Err(FrameError::Empty)
            } else {
                Ok(Incoming::Heartbeat)
            };
        }

        let (head, rest) = match trimmed.find("\n\n") {
            Some(i) => (&trimmed[..i], &trimmed[i + 2..]),
            None => match trimmed.find("\r\n\r\n") {
                Some(i) => (&trimmed[..i], &trimmed[i + 4..]),
                None => return Err(FrameError::Unterminated),
            },
        };

        let mut lines = head.lines();
        let command_line = lines.next().ok_or(FrameError::Empty)?;
        let command = Command::parse(command_line.trim_end_matches('\r'))?;
        let unescape_headers = !matches!(command, Command::Connect | Command::Connected);

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (k, v) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if unescape_headers {
                headers.push((unescape(k)?, unescape(v)?));
            } else {
                headers.push((k.to_string(), v.to_string()));
            }
        }

        let declared = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.trim().parse::<usize>().ok());

        let body = match declared {
            Some(len) => {
                let bytes = rest.as_bytes();
                if bytes.len() < len {
                    return Err(FrameError::ContentLength {
                        declared: len,
                        available: bytes.len(),
                    });
                }
                std::str::from_utf8(&bytes[..len])
                    .map_err(|_| FrameError::NotUtf8)?
                    .to_string()
            }
            None => match rest.find('\0') {
                Some(end) => rest[..end].to_string(),
                None => return Err(FrameError::Unterminated),
            },
        };

        Ok(Incoming::Frame(Frame {
            command,
            headers,
            body,
        }))
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some(other) => return Err(FrameError::InvalidEscape(other)),
            None => return Err(FrameError::InvalidEscape(' ')),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
