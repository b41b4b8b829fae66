//! Core business logic modules.

pub mod extract;
pub mod loader;
pub mod pipeline;
pub mod store;
pub mod transform;
