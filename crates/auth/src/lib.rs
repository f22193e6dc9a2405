//! `eventick-auth` — token and credential boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! claims, roles, HS256 tokens and password digests, plus the `UserDirectory`
//! seam the login endpoints persist users through.

pub mod claims;
pub mod directory;
pub mod jwt;
pub mod password;
pub mod roles;

pub use claims::{Claims, TokenError, validate_claims};
pub use directory::{DirectoryError, UserDirectory, UserRecord};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use password::{hash_password, verify_password};
pub use roles::Role;
