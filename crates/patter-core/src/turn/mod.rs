//! The reasoning loop and the service around it.
//!
//! One user turn flows through this module: `TurnService` loads the
//! conversation and tenant, `TurnContext` assembles the model-facing window,
//! `TurnRunner` drives the bounded tool-calling loop, and `fallback`
//! synthesizes a reply when the loop is capped or aborted.

pub mod context;
pub mod fallback;
pub mod runner;
pub mod service;
