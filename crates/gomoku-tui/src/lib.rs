// Face Gomoku terminal client.
//
// `app` drives the game session and talks to the server; `tui` draws it and
// turns keys and clicks into commands. `protocol` defines the messages
// passed between them.

pub mod app;
pub mod protocol;
pub mod tui;
