#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod logging;
pub mod markdown;
pub mod nav;
pub mod render;
pub mod tabnews;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
