//! Infrastructure layer for Patter.
//!
//! Contains implementations of the collaborator traits defined in
//! `patter-core`: SQLite persistence, the OpenAI-compatible model client,
//! WooCommerce and Shopify commerce providers with their detectors, vector
//! search backends, and TOML configuration loaders.

pub mod commerce;
pub mod config;
pub mod llm;
pub mod sqlite;
pub mod tenant;
pub mod vector;
