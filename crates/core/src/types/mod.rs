//! Core types for the LineMart storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod email;
pub mod id;
pub mod merch;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use account::StoredUser;
pub use email::{Email, EmailError};
pub use id::*;
pub use merch::{Advertisement, Deal, Notification, Promotion};
pub use order::{Order, RemoteCart, RemoteCartItem};
pub use price::{CurrencyCode, Price, round_cents};
pub use product::{
    Category, DEFAULT_PRODUCT_IMAGE, DEFAULT_RATING, Product, Subcategory, UNCATEGORIZED,
};
pub use status::*;
