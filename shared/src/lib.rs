//! Shared types for the Mercado marketplace backend
//!
//! Common types used across crates: the unified error system,
//! order lifecycle domain types, and small utilities.

pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
