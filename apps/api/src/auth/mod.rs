//! Authentication: password hashing, bearer tokens and the `AuthUser` extractor.

pub mod extractor;
pub mod handlers;
pub mod repository;
pub mod tokens;

pub use extractor::AuthUser;
