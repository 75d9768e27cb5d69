pub mod micropost;
pub mod subscription;
pub mod user;

pub use micropost::{CreateMicropostRequest, Micropost, MicropostScope, MicropostSource};
pub use subscription::Subscription;
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserScope};
