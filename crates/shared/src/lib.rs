//! Shared types, auth, and configuration for Kontera.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration management
//! - JWT claims and token validation
//! - The caller identity consumed by the visibility filter

pub mod auth;
pub mod config;
pub mod jwt;

pub use auth::{Caller, Claims};
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
