//! Core types and utilities for the SwapC price comparison service
//!
//! This crate provides shared types used across all components:
//! - Token and pair definitions
//! - Quote and failure types, quote validation
//! - Ranking of collected quotes
//! - Configuration sections and error types

pub mod types;
pub mod tokens;
pub mod quotes;
pub mod ranking;
pub mod config;
pub mod errors;

pub use types::*;
pub use tokens::*;
pub use quotes::*;
pub use ranking::*;
pub use config::*;
pub use errors::*;
