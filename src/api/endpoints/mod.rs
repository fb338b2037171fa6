//! API endpoint handlers.
//!
//! Each module covers one part of the surface: chat (message +
//! clear-history), status (health + runtime status), tools (catalog +
//! invocation).

pub mod chat;
pub mod status;
pub mod tools;
