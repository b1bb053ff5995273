pub mod jwt;
pub mod password;
pub mod repo_types;
pub mod services;

pub use jwt::{JwtKeys, Session};
