//! Stockroom backend library.
//!
//! Exposes the backend as a library so the HTTP layer, services, and
//! storage can be tested and reused outside the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
