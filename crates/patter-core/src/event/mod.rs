//! Telemetry event distribution for Patter.
//!
//! Turn progress is observable through `TurnEvent` values published on a
//! broadcast bus. Publishing is fire-and-forget: a slow or absent subscriber
//! never blocks or fails the turn that emitted the event.

pub mod bus;
