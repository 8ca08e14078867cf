pub mod auth;

pub use auth::{AuthData, authenticate_user};
