//! Integration tests for fxbot.
//!
//! These tests drive the assembled application through its collaborators'
//! mocks:
//! - Channel messages through parsing and dispatch
//! - Listener lifecycle via channel CRUD and start/stop
//! - The REST API router

pub mod common;
