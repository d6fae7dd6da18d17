//! Wire objects for the Open Theatre Booking server.
//!
//! This crate holds the request/response bodies, WebSocket frames and
//! notification payloads exchanged between `otb-server` and its clients.
//! It carries no engine logic.

pub mod objects;
