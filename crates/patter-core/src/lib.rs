//! Turn orchestration and repository trait definitions for Patter.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the engine that drives a bounded
//! tool-calling reasoning loop over them. It depends only on `patter-types`
//! -- never on `patter-infra` or any database/IO crate.

pub mod cache;
pub mod commerce;
pub mod event;
pub mod llm;
pub mod memory;
pub mod retry;
pub mod search;
pub mod store;
pub mod tool;
pub mod turn;
