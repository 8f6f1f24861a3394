//! Thin HTTP surface over the window aggregator.

pub mod handlers;
pub mod router;

pub use router::{AppState, api_router};
