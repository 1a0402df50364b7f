//! Application services layer.

pub mod content;
pub mod error;
pub mod revalidate;
mod sanitize;
pub mod site;
