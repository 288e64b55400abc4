//! Authentication primitives for the session service.
//!
//! Provides:
//! - Password hashing (Argon2id) and a password strength policy
//! - Access token signing and verification (JWT, HS256)
//! - Opaque bearer secrets for refresh and reset tokens, stored only as digests
//! - Authentication coordination
//!
//! Nothing here performs I/O. Services define their own ports and adapt these
//! implementations behind them.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("not_my_password", &hash).unwrap());
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let signed = handler.issue(42, Duration::minutes(15)).unwrap();
//! let claims = handler.verify(&signed.token).unwrap();
//! assert_eq!(claims.sub, "42");
//! ```
//!
//! ## Opaque Secrets
//! ```
//! use auth::OpaqueToken;
//!
//! let secret = OpaqueToken::generate();
//! let stored = secret.digest();
//! assert_eq!(OpaqueToken::from_presented(secret.expose()).digest(), stored);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod token;

pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SignedToken;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use token::OpaqueToken;
pub use token::TokenDigest;
