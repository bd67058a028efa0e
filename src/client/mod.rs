//! Terminal client for the forum API.

pub mod api;
pub mod optimistic;
pub mod session;
pub mod shell;
pub mod views;

pub use api::{ClientError, ForumApi, HttpForumClient};
pub use session::{Session, SessionStore};
