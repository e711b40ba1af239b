//! Hellomvc HTTP API
//!
//! hyper-based host for the request-body JSON routes.

mod server;

pub use server::{handle_request, run_server, serve, AppState};
