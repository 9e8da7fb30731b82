//! Conditionals, loops and dispatch on the entry type

use exbib::code::BuiltIn;
use exbib::error::{self, Error};
use exbib::prelude::*;
use std::sync::Arc;

/// Name of the function that `call.type$` falls back to.
pub const DEFAULT_TYPE: &str = "default.type";

/// Get the `if$` built-in function.
pub fn get_if() -> BuiltIn {
    BuiltIn::new(if_fn).with_doc(
        "Pop an else branch, a then branch and an integer condition; run the then branch if the condition is positive and the else branch otherwise

Branches are blocks or quoted function names.",
    )
}

fn if_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let else_branch = processor.pop()?;
    let then_branch = processor.pop()?;
    let condition = processor.pop_integer()?;
    let branch = if condition > 0 {
        then_branch
    } else {
        else_branch
    };
    processor.execute_callable(&branch, entry, locator)
}

/// Get the `while$` built-in function.
pub fn get_while() -> BuiltIn {
    BuiltIn::new(while_fn).with_doc(
        "Pop a body and a condition; run the body for as long as running the condition pushes a positive integer",
    )
}

fn while_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let body = processor.pop()?;
    let condition = processor.pop()?;
    loop {
        processor.execute_callable(&condition, entry, locator)?;
        if processor.pop_integer()? <= 0 {
            return Ok(());
        }
        processor.execute_callable(&body, entry, locator)?;
    }
}

/// Get the `call.type$` built-in function.
pub fn get_call_type() -> BuiltIn {
    BuiltIn::new(call_type_fn).with_doc(
        "Call the function named by the type of the current entry, or `default.type` if there is no such function",
    )
}

fn call_type_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let Some(current) = entry else {
        return Err(Error::new(error::Kind::MissingEntry, locator));
    };
    let entry_type = current.entry_type().to_lowercase();
    let name: Arc<str> = if processor.get_function(&entry_type).is_some() {
        entry_type.into()
    } else {
        DEFAULT_TYPE.into()
    };
    processor.call_at(&name, entry, locator)
}
