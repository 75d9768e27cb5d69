pub mod micropost_service;
pub mod password;
pub mod token;
pub mod user_service;

pub use micropost_service::{MicropostService, MicropostServiceError};
pub use token::TokenDigest;
pub use user_service::{UserService, UserServiceError};
