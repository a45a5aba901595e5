//! Palmetto Cart - Shopping cart store with durable persistence.
//!
//! This crate owns the authoritative in-process cart state:
//!
//! - [`CartStore`] applies mutations in invocation order against the latest
//!   in-memory state and re-persists the full line list after each one.
//! - [`CartStorage`] abstracts the durable slot the serialized cart lives in;
//!   [`FileStore`] is the file-backed implementation, [`MemoryStore`] the
//!   ephemeral one.
//!
//! The store is hydrated exactly once, when it is opened. Opening returns a
//! ready store, so no mutation (and therefore no write) can race the initial
//! read. Storage failures are never surfaced to callers: they are logged and
//! the in-memory state remains the source of truth.
//!
//! # Example
//!
//! ```rust,ignore
//! use palmetto_cart::{CartStore, FileStore, ProductSnapshot};
//! use palmetto_core::Price;
//!
//! let storage = FileStore::new("./data");
//! let mut cart = CartStore::open(storage).await;
//!
//! cart.add_item(ProductSnapshot {
//!     id: "p-1".into(),
//!     name: "Linen shirt".to_string(),
//!     price: Price::from_major(49),
//!     image: "/img/linen-shirt.jpg".to_string(),
//! })
//! .await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod error;
mod line;
mod storage;
mod store;

pub use error::StorageError;
pub use line::{CartLine, ProductSnapshot};
pub use storage::{CART_SLOT, CartStorage, FileStore, MemoryStore};
pub use store::CartStore;
