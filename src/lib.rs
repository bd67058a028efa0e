pub mod app;
pub mod auth;
pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod extract;
pub mod memory;
pub mod questions;
pub mod shared;
pub mod state;
