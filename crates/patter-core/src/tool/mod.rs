//! Model-facing tools for Patter.
//!
//! Tools are a closed set of named variants, each with a typed argument
//! struct whose JSON schema is derived and handed to the model. The
//! registry narrows the set to what a tenant's configuration supports; the
//! executor dispatches one call against the search and commerce layers.

pub mod executor;
pub mod registry;
