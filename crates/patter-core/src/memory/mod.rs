//! Conversation memory for Patter.
//!
//! Tracks what a conversation has been about (entities, the last list the
//! shopper saw, corrections) and resolves referring phrases like "the second
//! one" against that state. All resolution is pure: same metadata and
//! phrase, same answer.

pub mod manager;
pub mod reference;
