//! Test harnesses for the simple tax endpoints.
//!
//! Provides `CustomFieldBuilder` for storage fixtures and `TestServer`
//! for full-stack HTTP tests.

pub mod builders;
pub mod server;

pub use builders::CustomFieldBuilder;
pub use server::{TestError, TestServer};
