//! Layered product search for Patter.
//!
//! Dispatch tries the cheapest authoritative source first and falls through:
//! exact SKU lookup, then the tenant's commerce catalog, then the semantic
//! index. A stage that *errors* falls through like a stage that finds
//! nothing, but the final report records the difference so an outage is
//! never reported as an empty catalog.

pub mod domain;
pub mod orchestrator;
pub mod sku;
pub mod vector;
