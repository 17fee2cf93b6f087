// Public API for integration tests and embedding the hub in another server

pub mod api;
pub mod app;
pub mod broadcast;
pub mod classify;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod types;
pub mod ws;
