//! HTTP server for SwapC
//!
//! Exposes price comparison and the dashboard polling view over the
//! aggregator and its result cache

pub mod conversions;
pub mod server;
pub mod service;
pub mod settings;

pub use server::{HttpServer, HttpServerBuilder};
pub use service::{router, ApiError, PriceService};
