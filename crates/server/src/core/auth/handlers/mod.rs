//! Auth Handlers

pub mod auth;
pub mod auth_me;

pub use auth::{change_password, login, signup};
pub use auth_me::{profile, verify};
