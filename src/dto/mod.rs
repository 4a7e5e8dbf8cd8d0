/// Entity creation, edit and read payloads.
pub mod content;
/// Game summary and rulebook payloads.
pub mod game;
/// Health check payloads.
pub mod health;
/// Server-Sent Events payloads.
pub mod sse;
/// Shared validator functions.
pub mod validation;
