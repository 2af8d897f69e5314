//! TechHub backend: signed-cookie sessions, role gates, and document collections
//! for products, reviews and users, served over HTTP with axum.

pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod server;
pub mod storage;
