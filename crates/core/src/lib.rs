//! LineMart Core - Shared types and UI-local state for the storefront.
//!
//! This crate provides the types used across all LineMart storefront
//! components:
//! - `storefront` - REST client, polling manager and dashboard shell
//! - `cli` - Command-line access to the customer API
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no timers. This keeps it lightweight and lets every
//! rule here be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, statuses, and catalog/order records
//! - [`cart`] - The local shopping cart
//! - [`checkout`] - Checkout totals and step transitions
//! - [`catalog`] - Category filtering and search

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartLine};
pub use checkout::{
    Checkout, CheckoutError, CheckoutStep, CheckoutTotals, PaymentInfo, ShippingInfo,
};
pub use types::*;
