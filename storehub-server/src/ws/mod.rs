//! WebSocket connection gateway

mod gateway;

pub use gateway::{ConnectQuery, ws_handler};
