//! Palmetto Core - Shared types library.
//!
//! This crate provides common types used across all Palmetto components:
//! - `cart` - Client-side shopping cart store with durable persistence
//! - `client` - Authenticated HTTP request pipeline
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
