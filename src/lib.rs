pub mod app;
pub mod config;
pub mod context;
pub mod engine;
pub mod event;
pub mod narration;
pub mod session;
pub mod store;
pub mod ui;
