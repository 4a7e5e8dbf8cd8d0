//! Library crate for game-forge-back, exposing modules for the binary and integration tests.

/// Application configuration file.
pub mod config;
/// Records, mutations and sync-layer backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers.
pub mod routes;
/// Operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
