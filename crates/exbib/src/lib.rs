//! # ExBib: a BibTeX style language interpreter.
//!
//! This crate implements the virtual machine that runs compiled BibTeX
//!     style (`.bst`) programs against bibliography entries.
//! A program is a sequence of [tokens](token::Token).
//! The [processor](processor::Processor) walks the sequence, executing each token
//!     against an operand stack, a table of functions and the entry currently being formatted.
//!
//! The built-in functions of the BibTeX language (`write$`, `if$`, `format.name$`, ...)
//!     live in the `exbib-stdlib` crate.
//! Parsing `.bst` files and loading bibliography databases is done elsewhere;
//!     this crate only consumes their results.

pub mod code;
pub mod entry;
pub mod error;
pub mod prelude;
pub mod processor;
pub mod token;
pub mod value;
