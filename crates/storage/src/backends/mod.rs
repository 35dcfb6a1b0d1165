//! Storage backend implementations.

pub mod local;
pub mod share;
