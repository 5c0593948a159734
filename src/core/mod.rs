//! # Core Module
//!
//! AEAD constructions, configuration and errors.

pub mod config;
pub mod crypto;
pub mod error;
