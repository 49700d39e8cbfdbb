//! Model client abstractions for Patter.
//!
//! This module defines the traits the reasoning loop calls models through:
//! - `ModelClient`: RPITIT trait for concrete backend implementations
//! - `BoxModelClient`: object-safe wrapper for runtime backend selection
//!
//! Implementations live in `patter-infra` (e.g. the OpenAI-compatible
//! HTTP client).

pub mod boxed;
pub mod client;
