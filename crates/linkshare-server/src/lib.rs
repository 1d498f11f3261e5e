//! linkshare-server: HTTP/JSON front end for the LinkShare account and
//! referral services.
//!
//! One process, one SQLite connection shared behind an async mutex. Each
//! request locks the connection for a single service call.

pub mod api;
pub mod config;
pub mod state;

pub use config::ServerConfig;
pub use state::AppState;
