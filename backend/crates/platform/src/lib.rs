//! Platform Crate - Technical Infrastructure
//!
//! Shared technical building blocks with no domain knowledge:
//! - Cookie building and parsing
//! - Small cryptographic helpers (Base64, constant-time compare, randomness)
//! - Password hashing (Argon2id with optional pepper)

pub mod cookie;
pub mod crypto;
pub mod password;
