//! Integration test utilities for the tic-tac-toe client
//!
//! This crate provides a mock backend (REST routes plus the WebSocket
//! gateway) and fixtures for end-to-end tests of the client crates.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
