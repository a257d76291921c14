//! # Reelshelf Server
//!
//! HTTP front end for a Reelshelf video library: listing, batch upload,
//! rename, delete, slate regeneration and custom covers, plus static serving
//! of the library directory.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
