//! Interfaces implemented outside the core.

pub mod resolver;

pub use resolver::{FnResolver, GrantResolver, StaticGrantResolver};
