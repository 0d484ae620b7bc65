//! Core types, configuration and the language model client

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
