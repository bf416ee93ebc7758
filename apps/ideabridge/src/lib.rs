//! # ideabridge
//!
//! Application layer over `ideabridge-core`: the HTTP API, the CLI, the
//! record descriptor loader and the remote kernel client.

pub mod api;
pub mod cli;
pub mod config;
pub mod kernel;
