// STOMP-over-WebSocket connection to a game room.
//
// `connect` performs the WebSocket and STOMP handshakes, subscribes to the
// room's stone and chat topics, then hands the socket to a background task.
// The task forwards broadcast bodies to the application as `TransportEvent`s
// and writes whatever the application publishes through `RoomConnection`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::message::{app_destination, Action, GameMessage, Topic};
use crate::stomp::{Command, Frame, FrameError, Incoming};

/// How long to wait for the broker's `CONNECTED` frame.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the outbound publish queue.
const OUTBOUND_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid STOMP frame: {0}")]
    Frame(#[from] FrameError),

    #[error("broker rejected connection: {0}")]
    Rejected(String),

    #[error("connection closed during handshake")]
    ClosedDuringHandshake,

    #[error("timed out waiting for CONNECTED")]
    HandshakeTimeout,

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection is closed")]
    Closed,
}

/// Events emitted by the room connection to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A broadcast arrived on one of the room's topics.
    Message { topic: Topic, body: String },
    /// The broker sent an `ERROR` frame.
    BrokerError(String),
    /// The socket closed or failed; no further events follow.
    Disconnected,
}

// ---------------------------------------------------------------------------
// RoomConnection
// ---------------------------------------------------------------------------

/// Handle to a live room connection.
///
/// Dropping the handle closes the outbound queue, which makes the background
/// task send `DISCONNECT` and exit.
pub struct RoomConnection {
    room_id: String,
    outbound: Option<mpsc::Sender<Frame>>,
    task: Option<JoinHandle<()>>,
}

impl RoomConnection {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }
}

/// One room's publish side, as seen by the application.
#[async_trait]
pub trait RoomLink: Send + Sync {
    /// Publish a message to `/app/{roomId}/{action}`.
    async fn publish(&self, action: Action, message: &GameMessage) -> Result<(), TransportError>;

    /// Close the connection. Further publishes fail with `Closed`.
    async fn close(&mut self);
}

#[async_trait]
impl RoomLink for RoomConnection {
    async fn publish(&self, action: Action, message: &GameMessage) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        let body = serde_json::to_string(message)?;
        let frame = Frame::send_json(&app_destination(&self.room_id, action), body);
        outbound.send(frame).await.map_err(|_| TransportError::Closed)
    }

    /// Gives the task a moment to send `DISCONNECT`.
    async fn close(&mut self) {
        self.outbound.take();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(Duration::from_secs(1), task).await.is_err() {
                debug!("room connection task did not finish in time");
            }
        }
    }
}

/// Opens room connections. The application holds one of these instead of
/// calling `connect` directly so the event loop can run against a fake.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn join(
        &self,
        room_id: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn RoomLink>, TransportError>;
}

/// `Broker` speaking STOMP over a WebSocket.
pub struct StompBroker {
    url: String,
    host: String,
}

impl StompBroker {
    pub fn new(server: &ServerConfig) -> Self {
        StompBroker {
            url: server.ws_url(),
            host: server.host(),
        }
    }
}

#[async_trait]
impl Broker for StompBroker {
    async fn join(
        &self,
        room_id: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn RoomLink>, TransportError> {
        let conn = connect(&self.url, &self.host, room_id, events).await?;
        Ok(Box::new(conn))
    }
}

/// Connect to the broker at `url`, join the STOMP session and subscribe to
/// the room's topics. Events are delivered on `events`.
pub async fn connect(
    url: &str,
    host: &str,
    room_id: &str,
    events: mpsc::Sender<TransportEvent>,
) -> Result<RoomConnection, TransportError> {
    info!("Connecting to {url} for room {room_id}");
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(Frame::connect(host).encode().into()))
        .await?;

    tokio::time::timeout(HANDSHAKE_TIMEOUT, await_connected(&mut read))
        .await
        .map_err(|_| TransportError::HandshakeTimeout)??;
    info!("STOMP session established");

    for (i, topic) in Topic::ALL.iter().enumerate() {
        let frame = Frame::subscribe(&format!("sub-{i}"), &topic.destination(room_id));
        write.send(Message::Text(frame.encode().into())).await?;
    }

    let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let task = tokio::spawn(async move {
        run_connection(read, write, outbound_rx, events).await;
    });

    Ok(RoomConnection {
        room_id: room_id.to_string(),
        outbound: Some(outbound),
        task: Some(task),
    })
}

/// Read frames until `CONNECTED`, skipping heart-beats.
async fn await_connected<St>(read: &mut St) -> Result<(), TransportError>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let text = match msg? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(TransportError::ClosedDuringHandshake),
            _ => continue,
        };
        match Frame::decode(text.as_str())? {
            Incoming::Heartbeat => continue,
            Incoming::Frame(f) if f.command == Command::Connected => return Ok(()),
            Incoming::Frame(f) if f.command == Command::Error => {
                let reason = f.get("message").unwrap_or(f.body.as_str()).to_string();
                return Err(TransportError::Rejected(reason));
            }
            Incoming::Frame(f) => {
                debug!("ignoring {} before CONNECTED", f.command);
            }
        }
    }
    Err(TransportError::ClosedDuringHandshake)
}

/// Pump frames in both directions until either side closes.
async fn run_connection<St, Si>(
    mut read: St,
    mut write: Si,
    mut outbound: mpsc::Receiver<Frame>,
    events: mpsc::Sender<TransportEvent>,
) where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    Si: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            msg = read.next() => {
                let Some(msg) = msg else { break };
                match forward_message(msg, &events).await {
                    Flow::Continue => {}
                    Flow::Stop => break,
                }
            }
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = write.send(Message::Text(frame.encode().into())).await {
                            warn!("failed to write frame: {e}");
                            break;
                        }
                    }
                    None => {
                        let _ = write
                            .send(Message::Text(Frame::disconnect().encode().into()))
                            .await;
                        let _ = write.close().await;
                        info!("room connection closed by client");
                        return;
                    }
                }
            }
        }
    }
    let _ = events.send(TransportEvent::Disconnected).await;
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Stop,
}

/// Translate one WebSocket message into zero or one `TransportEvent`.
async fn forward_message(
    msg: Result<Message, tokio_tungstenite::tungstenite::Error>,
    events: &mpsc::Sender<TransportEvent>,
) -> Flow {
    let text = match msg {
        Ok(Message::Text(text)) => text,
        Ok(Message::Close(_)) => {
            info!("broker sent close frame");
            return Flow::Stop;
        }
        Ok(_) => return Flow::Continue,
        Err(e) => {
            warn!("websocket error: {e}");
            return Flow::Stop;
        }
    };

    let frame = match Frame::decode(text.as_str()) {
        Ok(Incoming::Frame(f)) => f,
        Ok(Incoming::Heartbeat) => return Flow::Continue,
        Err(e) => {
            warn!("dropping undecodable frame: {e}");
            return Flow::Continue;
        }
    };

    let event = match frame.command {
        Command::Message => {
            let destination = frame.get("destination").unwrap_or_default();
            match Topic::from_destination(destination) {
                Some(topic) => TransportEvent::Message {
                    topic,
                    body: frame.body,
                },
                None => {
                    debug!("message on unexpected destination {destination}");
                    return Flow::Continue;
                }
            }
        }
        Command::Error => {
            let reason = frame
                .get("message")
                .map(str::to_string)
                .unwrap_or_else(|| frame.body.clone());
            TransportEvent::BrokerError(reason)
        }
        other => {
            debug!("ignoring {other} frame");
            return Flow::Continue;
        }
    };

    if events.send(event).await.is_err() {
        return Flow::Stop;
    }
    Flow::Continue
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{sink, stream};
    use std::pin::Pin;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    /// Socket write half that records every message it is given.
    fn recording_sink() -> (
        Pin<Box<impl Sink<Message, Error = WsError> + Send>>,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = sink::unfold(tx, |tx: mpsc::UnboundedSender<Message>, msg: Message| async move {
            tx.send(msg).map_err(|_| WsError::ConnectionClosed)?;
            Ok::<_, WsError>(tx)
        });
        (Box::pin(sink), rx)
    }

    fn text(msg: Message) -> String {
        match msg {
            Message::Text(t) => t.as_str().to_string(),
            other => panic!("expected text message, got {other:?}"),
        }
    }

    fn message_frame(destination: &str, body: &str) -> Message {
        Message::Text(format!("MESSAGE\ndestination:{destination}\nsubscription:sub-0\n\n{body}\0").into())
    }

    /// Run the connection over `messages` with the publish queue held open
    /// and collect everything it reports.
    async fn events_for(messages: Vec<Result<Message, WsError>>) -> Vec<TransportEvent> {
        let (tx, mut rx) = mpsc::channel(16);
        let (_publish, outbound) = mpsc::channel(1);
        let (write, _written) = recording_sink();

        run_connection(mock_stream(messages), write, outbound, tx).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn chat_message_forwarded_with_topic() {
        let events = events_for(vec![Ok(message_frame("/topic/r1/chat", r#"{"content":"hi"}"#))]).await;

        assert_eq!(
            events[0],
            TransportEvent::Message {
                topic: Topic::Chat,
                body: r#"{"content":"hi"}"#.to_string()
            }
        );
    }

    #[tokio::test]
    async fn stone_and_chat_keep_order() {
        let events = events_for(vec![
            Ok(message_frame("/topic/r1/stone", "1")),
            Ok(message_frame("/topic/r1/chat", "2")),
        ])
        .await;

        assert!(matches!(events[0], TransportEvent::Message { topic: Topic::Stone, .. }));
        assert!(matches!(events[1], TransportEvent::Message { topic: Topic::Chat, .. }));
    }

    #[tokio::test]
    async fn heartbeats_and_receipts_ignored() {
        let events = events_for(vec![
            Ok(Message::Text("\n".into())),
            Ok(Message::Text("RECEIPT\nreceipt-id:1\n\n\0".into())),
            Ok(Message::Ping(vec![].into())),
            Ok(message_frame("/topic/r1/chat", "after")),
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TransportEvent::Message { body, .. } if body == "after"));
    }

    #[tokio::test]
    async fn error_frame_reported() {
        let events = events_for(vec![Ok(Message::Text("ERROR\nmessage:bad destination\n\n\0".into()))]).await;

        assert_eq!(events[0], TransportEvent::BrokerError("bad destination".into()));
    }

    #[tokio::test]
    async fn garbage_frame_skipped() {
        let events = events_for(vec![
            Ok(Message::Text("NONSENSE\n\n\0".into())),
            Ok(message_frame("/topic/r1/chat", "ok")),
        ])
        .await;

        assert!(matches!(events[0], TransportEvent::Message { .. }));
    }

    #[tokio::test]
    async fn stream_end_reports_disconnect() {
        let events = events_for(vec![Ok(message_frame("/topic/r1/chat", "last"))]).await;

        assert_eq!(events.last(), Some(&TransportEvent::Disconnected));
    }

    #[tokio::test]
    async fn close_frame_stops_and_disconnects() {
        let events = events_for(vec![
            Ok(Message::Close(None)),
            Ok(message_frame("/topic/r1/chat", "late")),
        ])
        .await;

        assert_eq!(events, vec![TransportEvent::Disconnected]);
    }

    #[tokio::test]
    async fn broken_read_disconnects() {
        let events = events_for(vec![
            Err(WsError::ConnectionClosed),
            Ok(message_frame("/topic/r1/chat", "late")),
        ])
        .await;

        assert_eq!(events, vec![TransportEvent::Disconnected]);
    }

    #[tokio::test]
    async fn stops_when_application_is_gone() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let (_publish, outbound) = mpsc::channel(1);
        let (write, _written) = recording_sink();
        let read = mock_stream(vec![Ok(message_frame("/topic/r1/chat", "orphan"))])
            .chain(stream::pending());

        let run = run_connection(read, write, outbound, tx);
        assert!(tokio::time::timeout(Duration::from_secs(1), run).await.is_ok());
    }

    #[tokio::test]
    async fn published_frames_are_written_then_disconnect_on_drop() {
        let (tx, mut rx) = mpsc::channel(8);
        let (publish, outbound) = mpsc::channel(4);
        let (write, mut written) = recording_sink();
        let task = tokio::spawn(run_connection(
            stream::pending::<Result<Message, WsError>>(),
            write,
            outbound,
            tx,
        ));

        publish
            .send(Frame::send_json("/app/r1/stone", r#"{"x":7}"#.to_string()))
            .await
            .unwrap();
        drop(publish);
        task.await.unwrap();

        let send = text(written.recv().await.unwrap());
        assert!(send.starts_with("SEND\n"));
        assert!(send.contains("destination:/app/r1/stone"));
        assert!(send.contains(r#"{"x":7}"#));
        assert!(text(written.recv().await.unwrap()).starts_with("DISCONNECT"));
        assert!(written.recv().await.is_none());
        // Closing from our side is not reported as a lost connection.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn broken_write_disconnects() {
        let (tx, mut rx) = mpsc::channel(8);
        let (publish, outbound) = mpsc::channel(4);
        let write = Box::pin(sink::unfold((), |(), _msg: Message| async {
            Err::<(), _>(WsError::ConnectionClosed)
        }));
        let task = tokio::spawn(run_connection(
            stream::pending::<Result<Message, WsError>>(),
            write,
            outbound,
            tx,
        ));

        publish
            .send(Frame::send_json("/app/r1/chat", "{}".to_string()))
            .await
            .unwrap();
        task.await.unwrap();

        assert_eq!(rx.recv().await, Some(TransportEvent::Disconnected));
    }

    #[tokio::test]
    async fn handshake_waits_for_connected() {
        let mut read = mock_stream(vec![
            Ok(Message::Text("\n".into())),
            Ok(Message::Text("CONNECTED\nversion:1.2\n\n\0".into())),
        ]);
        assert!(await_connected(&mut read).await.is_ok());
    }

    #[tokio::test]
    async fn handshake_error_frame_rejects() {
        let mut read = mock_stream(vec![Ok(Message::Text(
            "ERROR\nmessage:auth failed\n\n\0".into(),
        ))]);
        let err = await_connected(&mut read).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(ref m) if m == "auth failed"));
    }

    #[tokio::test]
    async fn handshake_close_is_error() {
        let mut read = mock_stream(vec![Ok(Message::Close(None))]);
        let err = await_connected(&mut read).await.unwrap_err();
        assert!(matches!(err, TransportError::ClosedDuringHandshake));
    }
}
