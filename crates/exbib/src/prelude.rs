//! ExBib prelude.
//!
//! Glob-import this module to get the types that almost every built-in function needs.

pub use crate::entry::Entry;
pub use crate::processor::Processor;
pub use crate::token::{Locator, Token, TokenList};

/// Result type in ExBib.
pub type Result<T> = std::result::Result<T, Box<crate::error::Error>>;
