//! Rule models.
//!
//! This module defines rule expressions, the request context they are
//! evaluated against, and evaluation results.

pub mod context;
pub mod evaluation;
pub mod rule;

pub use context::RequestContext;
pub use evaluation::EvalResult;
pub use rule::{Leaf, Rule};
