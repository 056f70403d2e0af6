//! Stockroom Core - Shared types library.
//!
//! This crate provides common types used across the Stockroom backend:
//! type-safe entity IDs, the order status enum, and the content-addressed
//! cache key used by the storage layer's read caches.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, statuses, and cache keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
