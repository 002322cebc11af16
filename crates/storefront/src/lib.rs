//! LineMart Storefront library.
//!
//! Client-side data synchronization for the LineMart customer storefront:
//! a REST fetch layer with token auth and a cashier-endpoint fallback, a
//! polling manager that keeps catalog data fresh, and the state shells the
//! dashboard binary and CLI are built from.
//!
//! # Modules
//!
//! - [`api`] - REST client, customer endpoints, cashier fallback
//! - [`realtime`] - Polling subscriptions over a [`realtime::DataSource`]
//! - [`session`] - Persisted token and user profile
//! - [`auth`] - Login, registration, logout
//! - [`dashboard`] - Customer dashboard state
//! - [`checkout`] - Order placement
//! - [`state`] - The [`state::AppShell`] that owns all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod realtime;
pub mod session;
pub mod state;

pub use error::AppError;
pub use state::AppShell;
