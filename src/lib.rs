#![forbid(unsafe_code)]

//! Process orchestration and response protocol for the jpm chat window.
//!
//! Each submitted request runs a fresh worker process, its merged output is
//! classified line by line, and the resulting notifications drive a
//! busy/idle session that the presentation layer subscribes to.

pub mod config;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod supervisor;

pub use config::RelayConfig;
pub use errors::{AppError, Result};
