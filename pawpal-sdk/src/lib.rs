//! Shared types for the PawPal checkout server: request/response objects,
//! gateway webhook entities and the HMAC signature schemes.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
