//! Cartwright - cue-point trimming for broadcast automation inventories
//!
//! This library crate exposes the CLI's configuration loading and asset list
//! handling for integration testing.

pub mod batch;
pub mod config;
