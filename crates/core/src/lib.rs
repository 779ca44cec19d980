//! Canopy Core - Shared types library.
//!
//! This crate provides common types used across all Canopy Market components:
//! - `market` - Catalog and cart data-access facade
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe document keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
