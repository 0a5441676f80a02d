pub mod api;
pub mod app;
pub mod backend;
pub mod components;
pub mod composer;
pub mod config;
#[cfg(unix)]
pub mod ipc;
pub mod send;
pub mod share;
pub mod tui;
pub mod types;
pub mod utils;
