//! Marker traits separating writes from reads
//!
//! Every request type registered with the mediator implements exactly one of
//! these. Commands open a write transaction; queries never write.

/// Request that changes enrollment or progress state
pub trait Command {}

/// Read-only request
pub trait Query {}
