//! REST backend for the Zenova product catalogue: CRUD over a single MongoDB
//! `products` collection plus cookie-based JWT sessions.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod store;
