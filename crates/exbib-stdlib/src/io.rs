//! Writing the bibliography and warnings

use exbib::code::BuiltIn;
use exbib::prelude::*;

/// Get the `write$` built-in function.
pub fn get_write() -> BuiltIn {
    BuiltIn::new(write_fn).with_doc("Pop a value and append its text to the output")
}

fn write_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let token = processor.pop()?;
    let text = token.expand(processor)?;
    processor.write_output(&text)
}

/// Get the `newline$` built-in function.
pub fn get_newline() -> BuiltIn {
    BuiltIn::new(newline_fn).with_doc("End the current line of the output")
}

fn newline_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    processor.newline_output()
}

/// Get the `warning$` built-in function.
pub fn get_warning() -> BuiltIn {
    BuiltIn::new(warning_fn)
        .with_doc("Pop a string and print it as a warning to the terminal and the log")
}

fn warning_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let message = processor.pop_string()?;
    processor.warn(&message)
}
