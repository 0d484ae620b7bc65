//! HTTP webhook server

pub mod api;
