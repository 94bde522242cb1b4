//! Core business logic for confide.
//!
//! This crate holds everything between the transport adapter and the
//! database: the per-user conversation state engine, the moderation
//! pipeline, the comment/vote/report services, and the public-counter
//! synchronizer. The transport itself is only a capability trait here;
//! the bot crate supplies the HTTP implementation.

pub mod codec;
pub mod conversation;
pub mod services;
pub mod transport;

pub use services::*;
pub use transport::{
    ButtonPress, InlineButton, InlineKeyboard, MessageRef, RecordingTransport, Transport,
    TransportHandle, channel_markup,
};
