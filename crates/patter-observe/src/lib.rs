//! Observability for Patter.
//!
//! Tracing subscriber setup (structured logs, optional OpenTelemetry
//! export) and the OTel GenAI semantic-convention attribute names used to
//! instrument model and tool spans across the workspace.

pub mod genai_attrs;
pub mod tracing_setup;
