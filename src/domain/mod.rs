//! Domain layer: content entities, their fixed value sets and shape checks.

pub mod entities;
pub mod types;
pub mod validators;
