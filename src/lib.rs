pub mod app;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod logging;
pub mod navigation;
pub mod providers;
pub mod route;
pub mod search;
