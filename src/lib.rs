#![allow(clippy::uninlined_format_args)]

pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod logging;
pub mod render;
pub mod reply;
pub mod schedule;
pub mod session;
pub mod thread;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, Command};
pub use error::{Error, Result};
