//! Core types for Stockroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cache_key;
pub mod id;
pub mod status;

pub use cache_key::{CacheKey, KeyEncoder};
pub use id::*;
pub use status::{OrderStatus, ParseOrderStatusError};
