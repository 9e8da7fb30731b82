//! Conversions between integers, characters and strings

use exbib::code::BuiltIn;
use exbib::error::Error;
use exbib::prelude::*;

/// Get the `chr.to.int$` built-in function.
pub fn get_chr_to_int() -> BuiltIn {
    BuiltIn::new(chr_to_int_fn)
        .with_doc("Pop a string of exactly one character and push the character's code point")
}

fn chr_to_int_fn(processor: &mut Processor, _: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let s = processor.pop_string()?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            processor.push(Token::new_integer(i64::from(u32::from(c)), None));
            Ok(())
        }
        _ => Err(Error::invalid_argument(
            "chr.to.int$",
            format!["\"{s}\" is not a single character"],
            locator,
        )),
    }
}

/// Get the `int.to.chr$` built-in function.
pub fn get_int_to_chr() -> BuiltIn {
    BuiltIn::new(int_to_chr_fn)
        .with_doc("Pop an integer and push the one-character string with that code point")
}

fn int_to_chr_fn(processor: &mut Processor, _: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let i = processor.pop_integer()?;
    match u32::try_from(i).ok().and_then(char::from_u32) {
        Some(c) => {
            processor.push(Token::new_string(c.to_string(), None));
            Ok(())
        }
        None => Err(Error::invalid_argument(
            "int.to.chr$",
            format!["{i} is not a valid character code"],
            locator,
        )),
    }
}

/// Get the `int.to.str$` built-in function.
pub fn get_int_to_str() -> BuiltIn {
    BuiltIn::new(int_to_str_fn).with_doc("Pop an integer and push its decimal representation")
}

fn int_to_str_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let i = processor.pop_integer()?;
    processor.push(Token::new_string(i.to_string(), None));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib::error;
    use exbib_testing::*;
    use std::collections::HashMap;

    fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
        HashMap::from([
            ("chr.to.int$", get_chr_to_int()),
            ("int.to.chr$", get_int_to_chr()),
            ("int.to.str$", get_int_to_str()),
        ])
    }

    #[test]
    fn invalid_character_code_error() {
        let mut processor = Processor::new(built_in_functions());
        processor.push(Token::new_integer(-1, None));
        let err = processor.call("int.to.chr$", None).unwrap_err();
        assert!(matches!(
            err.kind(),
            error::Kind::InvalidArgument {
                function: "int.to.chr$",
                ..
            }
        ));
    }

    test_suite![
        stack_tests(
            (chr_to_int, r#""A" chr.to.int$"#, "#65"),
            (chr_to_int_non_ascii, r#""é" chr.to.int$"#, "#233"),
            (int_to_chr, r#"#97 int.to.chr$"#, r#""a""#),
            (round_trip, r#""z" chr.to.int$ int.to.chr$"#, r#""z""#),
            (int_to_str, r#"#-42 int.to.str$"#, r#""-42""#),
        ),
        failure_tests(
            (chr_to_int_empty, r#""" chr.to.int$"#),
            (chr_to_int_two_characters, r#""ab" chr.to.int$"#),
            (int_to_chr_negative, r#"#-1 int.to.chr$"#),
            (int_to_chr_surrogate, r#"#55296 int.to.chr$"#),
            (int_to_str_string, r#""1" int.to.str$"#),
        ),
    ];
}
