// src/lib.rs
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod email;
pub mod error;
pub mod export;
pub mod report;
pub mod sheet;
pub mod usage;

pub use error::{Error, Result};
