//! HTTP surface of the server.

mod health;
mod plugin;
mod router;


pub use router::{create_router, AppState, DEFAULT_MAX_BODY_SIZE};
