//! Transport layer (WebSocket pairing and forwarding).

pub mod ws;
