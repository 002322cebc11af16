//! CLI command implementations.

pub mod account;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod watch;
