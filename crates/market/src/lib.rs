//! Canopy Market data-access library.
//!
//! This crate provides read and write access to the catalog and per-user
//! shopping carts of a document-oriented store. It is the data layer only:
//! request routing, rendering, auth, and sessions live elsewhere.
//!
//! # Components
//!
//! - [`db::CartStore`] - one cart document per user; read, atomic append,
//!   quantity update/removal
//! - [`db::CatalogStore`] - category aggregation, paginated browse and
//!   search, single-item fetch, related items, review append
//! - [`store`] - the storage collaborator contract and an in-process
//!   [`store::MemoryStore`] backend
//!
//! The store is treated as an external collaborator that is atomic at the
//! single-document level only; there are no transactions. Write paths that
//! must read-modify-write a whole document serialize per key so that
//! same-key writers cannot lose each other's updates, while operations on
//! different keys stay fully parallel.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use config::MarketConfig;
pub use db::{CartStore, CatalogStore};
pub use error::{DataError, Result};
