//! Stack manipulation and stack inspection

use exbib::code::BuiltIn;
use exbib::prelude::*;

/// Get the `duplicate$` built-in function.
pub fn get_duplicate() -> BuiltIn {
    BuiltIn::new(duplicate_fn).with_doc("Pop a value and push it twice")
}

fn duplicate_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let token = processor.pop()?;
    processor.push(token.clone());
    processor.push(token);
    Ok(())
}

/// Get the `pop$` built-in function.
pub fn get_pop() -> BuiltIn {
    BuiltIn::new(pop_fn).with_doc("Pop a value and discard it")
}

fn pop_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    processor.pop()?;
    Ok(())
}

/// Get the `swap$` built-in function.
pub fn get_swap() -> BuiltIn {
    BuiltIn::new(swap_fn).with_doc("Swap the two values at the top of the stack")
}

fn swap_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let b = processor.pop()?;
    let a = processor.pop()?;
    processor.push(b);
    processor.push(a);
    Ok(())
}

/// Get the `skip$` built-in function.
pub fn get_skip() -> BuiltIn {
    BuiltIn::new(skip_fn).with_doc("Do nothing")
}

fn skip_fn(_: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    Ok(())
}

/// Get the `stack$` built-in function.
pub fn get_stack() -> BuiltIn {
    BuiltIn::new(stack_fn).with_doc("Pop the whole stack and write its values to the log, the top first")
}

fn stack_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let stack = processor.take_stack();
    for token in stack.iter().rev() {
        processor.write_log(&token.to_string())?;
    }
    Ok(())
}

/// Get the `top$` built-in function.
pub fn get_top() -> BuiltIn {
    BuiltIn::new(top_fn).with_doc("Pop a value and write it to the log")
}

fn top_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let token = processor.pop()?;
    processor.write_log(&token.to_string())
}
