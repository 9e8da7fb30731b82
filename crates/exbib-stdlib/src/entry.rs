//! Access to the current entry and the database

use exbib::code::BuiltIn;
use exbib::error::{self, Error};
use exbib::prelude::*;
use exbib::token::{T_ONE, T_ZERO};

fn require_entry<'a>(entry: Option<&'a Entry>, locator: Option<&Locator>) -> Result<&'a Entry> {
    entry.ok_or_else(|| Error::new(error::Kind::MissingEntry, locator))
}

fn push_bool(processor: &mut Processor, b: bool) {
    processor.push(if b { T_ONE.get() } else { T_ZERO.get() }.clone());
}

/// Get the `cite$` built-in function.
pub fn get_cite() -> BuiltIn {
    BuiltIn::new(cite_fn).with_doc("Push the cite key of the current entry")
}

fn cite_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let key = require_entry(entry, locator)?.key();
    processor.push(Token::new_string(key, None));
    Ok(())
}

/// Get the `type$` built-in function.
pub fn get_type() -> BuiltIn {
    BuiltIn::new(type_fn).with_doc("Push the type of the current entry, in lowercase")
}

fn type_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let entry_type = require_entry(entry, locator)?.entry_type().to_lowercase();
    processor.push(Token::new_string(entry_type, None));
    Ok(())
}

/// Get the `empty$` built-in function.
pub fn get_empty() -> BuiltIn {
    BuiltIn::new(empty_fn).with_doc(
        "Pop a value and push 1 if it is a missing field or a string of only whitespace, 0 otherwise

Integers are never empty.",
    )
}

fn empty_fn(processor: &mut Processor, _: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let token = processor.pop()?;
    let Some(value) = token.value() else {
        return Err(Error::type_mismatch(
            "a string",
            &token,
            token.locator().or(locator),
        ));
    };
    push_bool(processor, value.is_blank());
    Ok(())
}

/// Get the `missing$` built-in function.
pub fn get_missing() -> BuiltIn {
    BuiltIn::new(missing_fn)
        .with_doc("Pop a value and push 1 if it is a field that the entry does not have, 0 otherwise")
}

fn missing_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let value = processor.pop()?;
    push_bool(processor, value.is_null());
    Ok(())
}

/// Get the `preamble$` built-in function.
pub fn get_preamble() -> BuiltIn {
    BuiltIn::new(preamble_fn)
        .with_doc("Push the concatenation of all `@PREAMBLE` strings of the database")
}

fn preamble_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let preamble = processor.database().preamble().concat();
    processor.push(Token::new_string(preamble, None));
    Ok(())
}
