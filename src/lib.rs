pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod ollama;
pub mod reveal;
pub mod session;
pub mod transcript;
pub mod ui;
