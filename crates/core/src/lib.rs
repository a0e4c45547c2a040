//! Temple POS Core - Shared domain types.
//!
//! This crate provides the types used across all Temple POS components:
//! - `storefront` - Public-facing event and plan booking site
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The cart aggregate lives here so that its invariants can
//! be tested without a session store.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - The shopping cart aggregate and its persisted snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    Cart, CartChange, CartItem, CartItemDescriptor, CartSnapshot, IgnoreReason, SnapshotError,
};
pub use types::*;
