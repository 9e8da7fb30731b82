//! Integer arithmetic and comparisons

use exbib::code::BuiltIn;
use exbib::error::Error;
use exbib::prelude::*;
use exbib::token::{T_ONE, T_ZERO};

/// Get the `+` built-in function.
pub fn get_plus() -> BuiltIn {
    get_binary_op::<Plus>()
}

/// Get the `-` built-in function.
pub fn get_minus() -> BuiltIn {
    get_binary_op::<Minus>()
}

/// Get the `<` built-in function.
pub fn get_less_than() -> BuiltIn {
    get_binary_op::<LessThan>()
}

/// Get the `>` built-in function.
pub fn get_greater_than() -> BuiltIn {
    get_binary_op::<GreaterThan>()
}

fn get_binary_op<O: BinaryOp>() -> BuiltIn {
    BuiltIn::new(binary_op_fn::<O>).with_doc(O::DOC)
}

/// An operation on the two integers at the top of the stack.
trait BinaryOp {
    const DOC: &'static str;
    /// Applies the operation; `a` is the deeper of the two operands.
    fn apply(a: i64, b: i64) -> i64;
}

struct Plus;

impl BinaryOp for Plus {
    const DOC: &'static str = "Pop two integers and push their sum";
    fn apply(a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }
}

struct Minus;

impl BinaryOp for Minus {
    const DOC: &'static str = "Pop two integers and push the deeper one minus the top one";
    fn apply(a: i64, b: i64) -> i64 {
        a.wrapping_sub(b)
    }
}

struct LessThan;

impl BinaryOp for LessThan {
    const DOC: &'static str = "Pop two integers and push 1 if the deeper one is smaller, 0 otherwise";
    fn apply(a: i64, b: i64) -> i64 {
        i64::from(a < b)
    }
}

struct GreaterThan;

impl BinaryOp for GreaterThan {
    const DOC: &'static str = "Pop two integers and push 1 if the deeper one is larger, 0 otherwise";
    fn apply(a: i64, b: i64) -> i64 {
        i64::from(a > b)
    }
}

fn binary_op_fn<O: BinaryOp>(
    processor: &mut Processor,
    _: Option<&Entry>,
    _: Option<&Locator>,
) -> Result<()> {
    let b = processor.pop_integer()?;
    let a = processor.pop_integer()?;
    processor.push(Token::new_integer(O::apply(a, b), None));
    Ok(())
}

/// Get the `=` built-in function.
pub fn get_equals() -> BuiltIn {
    BuiltIn::new(equals_fn)
        .with_doc("Pop two integers or two strings and push 1 if they are equal, 0 otherwise")
}

fn equals_fn(processor: &mut Processor, _: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let b = processor.pop()?;
    let a = processor.pop()?;
    let equal = match (a.int_value(), b.int_value(), a.string_value(), b.string_value()) {
        (Some(a), Some(b), _, _) => a == b,
        (_, _, Some(a), Some(b)) => a == b,
        _ => {
            let expected = if a.int_value().is_some() {
                "an integer"
            } else {
                "a string"
            };
            return Err(Error::type_mismatch(expected, &b, b.locator().or(locator)));
        }
    };
    processor.push(if equal { T_ONE.get() } else { T_ZERO.get() }.clone());
    Ok(())
}
