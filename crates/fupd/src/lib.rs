//! fupd - Keeps a headless Factorio installation on the latest release of
//! its channel.
//!
//! The binary in `main.rs` wires the production collaborators together; the
//! modules here hold everything else so the integration tests can drive the
//! same code with fakes.

pub mod config;
pub mod game;
pub mod pipeline;
pub mod remote;
pub mod runner;
pub mod selftest;
