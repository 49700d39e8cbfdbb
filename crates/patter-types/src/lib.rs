//! Shared domain types for Patter.
//!
//! This crate contains the core domain types used across the Patter engine:
//! conversations, metadata, tenants, commerce data, search reports, model
//! messages, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod commerce;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod llm;
pub mod metadata;
pub mod search;
pub mod tenant;
