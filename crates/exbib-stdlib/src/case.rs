//! Case conversion

use crate::text::{special_parts, units, SpecialPart, Unit};
use exbib::code::BuiltIn;
use exbib::prelude::*;

/// A case conversion understood by `change.case$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    /// Lower case, except for the first character and characters that follow a colon and whitespace.
    Title,
    Lower,
    Upper,
}

impl Conversion {
    fn parse(letter: &str) -> Option<Conversion> {
        match letter.chars().next()? {
            't' | 'T' => Some(Conversion::Title),
            'l' | 'L' => Some(Conversion::Lower),
            'u' | 'U' => Some(Conversion::Upper),
            _ => None,
        }
    }
}

/// Converts the case of the text.
///
/// Characters inside brace groups are left alone.
/// Special characters are converted, including the control sequences of foreign letters.
pub(crate) fn change_case(s: &str, conversion: Conversion) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_colon = false;
    let mut prev_char: Option<char> = None;
    for (i, unit) in units(s).enumerate() {
        let protected = conversion == Conversion::Title
            && (i == 0 || (prev_colon && prev_char.is_some_and(char::is_whitespace)));
        match unit {
            Unit::Char { c, depth: 0 } => {
                if protected {
                    result.push(c);
                } else if conversion == Conversion::Upper {
                    result.extend(c.to_uppercase());
                } else {
                    result.extend(c.to_lowercase());
                }
                if c == ':' {
                    prev_colon = true;
                } else if !c.is_whitespace() {
                    prev_colon = false;
                }
                prev_char = Some(c);
            }
            Unit::Char { c, .. } => {
                result.push(c);
                prev_char = Some(c);
            }
            Unit::Open { .. } => {
                result.push('{');
                prev_char = Some('{');
            }
            Unit::Close { .. } => {
                result.push('}');
                prev_char = Some('}');
            }
            Unit::Special(special) => {
                if protected {
                    result.push_str(special);
                } else {
                    convert_special(&mut result, special, conversion == Conversion::Upper);
                }
                prev_colon = false;
                prev_char = special.chars().last();
            }
        }
    }
    result
}

fn convert_special(result: &mut String, special: &str, upper: bool) {
    result.push('{');
    for part in special_parts(special) {
        match part {
            SpecialPart::ControlSequence(name) if upper => match name {
                // Dotless i and j become ordinary capitals.
                "i" | "j" => result.push_str(&name.to_uppercase()),
                "oe" | "ae" | "aa" | "o" | "l" => {
                    result.push('\\');
                    result.push_str(&name.to_uppercase());
                }
                _ => {
                    result.push('\\');
                    result.push_str(name);
                }
            },
            SpecialPart::ControlSequence(name) => {
                result.push('\\');
                match name {
                    "OE" | "AE" | "AA" | "O" | "L" => result.push_str(&name.to_lowercase()),
                    _ => result.push_str(name),
                }
            }
            SpecialPart::Char(c) if upper => result.extend(c.to_uppercase()),
            SpecialPart::Char(c) => result.extend(c.to_lowercase()),
        }
    }
    if special.ends_with('}') {
        result.push('}');
    }
}

/// Get the `change.case$` built-in function.
pub fn get_change_case() -> BuiltIn {
    BuiltIn::new(change_case_fn).with_doc(
        r"Pop a conversion and a string; push the string converted to title (t), lower (l) or upper (u) case

Text in braces is not converted, except for special characters like {\'E}.",
    )
}

fn change_case_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let letter = processor.pop_string()?;
    let s = processor.pop_string()?;
    let converted = match Conversion::parse(&letter) {
        Some(conversion) => change_case(&s, conversion),
        None => {
            processor.warn(&format!["\"{letter}\" is an illegal case-conversion string"])?;
            s.to_string()
        }
    };
    processor.push(Token::new_string(converted, None));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib_testing::*;
    use std::collections::HashMap;

    fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
        HashMap::from([("change.case$", get_change_case())])
    }

    #[test]
    fn title_case() {
        assert_eq!(
            change_case("The Art of {LaTeX}: A Guide", Conversion::Title),
            "The art of {LaTeX}: A guide"
        );
    }

    #[test]
    fn lower_and_upper_case() {
        assert_eq!(change_case("Hello {World}", Conversion::Lower), "hello {World}");
        assert_eq!(change_case("Hello {World}", Conversion::Upper), "HELLO {World}");
    }

    #[test]
    fn special_characters() {
        assert_eq!(change_case(r"{\'E}COLE", Conversion::Lower), r"{\'e}cole");
        assert_eq!(change_case(r"{\OE}uvre", Conversion::Lower), r"{\oe}uvre");
        assert_eq!(change_case(r"{\oe}uvre", Conversion::Upper), r"{\OE}UVRE");
        assert_eq!(change_case(r"na{\i}ve", Conversion::Upper), r"NA{I}VE");
        assert_eq!(change_case(r"{\'E}cole", Conversion::Title), r"{\'E}cole");
    }

    test_suite![
        stack_tests(
            (title, r#""A Title: Of Sorts" "t" change.case$"#, r#""A title: Of sorts""#),
            (lower, r#""ABC" "l" change.case$"#, r#""abc""#),
            (upper, r#""abc" "U" change.case$"#, r#""ABC""#),
            (illegal_conversion, r#""abc" "x" change.case$"#, r#""abc""#),
        ),
        failure_tests((missing_conversion, r#""abc" change.case$"#),),
    ];
}
