//! Hellomvc Core Library
//!
//! This crate provides the core functionality for the hellomvc server:
//! the `HelloData` model and its JSON decoder, the request-body handlers,
//! body binding, routing, configuration management and error handling.

pub mod config;
pub mod error;
pub mod model;
pub mod server;

pub use error::{Error, Result};
pub use model::{DecodeError, HelloData, HttpEntity};

/// Hellomvc version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
