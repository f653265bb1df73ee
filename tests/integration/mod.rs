//! Integration tests over the in-memory store.

pub mod entities;
pub mod lifecycle;
pub mod scoped;
pub mod validators;
