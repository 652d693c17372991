pub mod action;
pub mod app;
pub mod clock;
pub mod collector;
pub mod config;
pub mod event;
pub mod format;
pub mod logging;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod system;
pub mod ui;
