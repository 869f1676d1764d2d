// Core of the Face Gomoku client: board model, wire messages, STOMP
// transport, HTTP API client, configuration and session state.

pub mod api;
pub mod board;
pub mod config;
pub mod message;
pub mod prefs;
pub mod session;
pub mod stomp;
pub mod transport;
