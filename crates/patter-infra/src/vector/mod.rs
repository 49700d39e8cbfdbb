//! Semantic search backends.
//!
//! Two implementations of the core `VectorSearch` trait: an HTTP client for
//! a hosted embedding index, and an in-memory index with a deterministic
//! hashed embedder for tests and single-node deployments.

pub mod http;
pub mod memory;
