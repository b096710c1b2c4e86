//! Chat transport abstraction.
//!
//! The request pipeline talks to the messaging platform only through the
//! traits defined here; the Telegram crate provides the concrete
//! implementation and tests provide recording fakes.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChatOutbound, InboundMessage, MediaUpload},
};
