//! String operations: concatenation, substrings, quotes and periods

use exbib::code::BuiltIn;
use exbib::prelude::*;

/// Get the `*` built-in function.
pub fn get_concatenate() -> BuiltIn {
    BuiltIn::new(concatenate_fn)
        .with_doc("Pop two strings and push their concatenation, the deeper string first")
}

fn concatenate_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let b = processor.pop_string()?;
    let a = processor.pop_string()?;
    let mut s = String::with_capacity(a.len() + b.len());
    s.push_str(&a);
    s.push_str(&b);
    processor.push(Token::new_string(s, None));
    Ok(())
}

/// Get the `substring$` built-in function.
pub fn get_substring() -> BuiltIn {
    BuiltIn::new(substring_fn).with_doc(
        "Pop a length, a start and a string; push the substring

The start is 1-based. A negative start counts from the end of the string,
and the substring then ends at that position.",
    )
}

fn substring_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let len = processor.pop_integer()?;
    let start = processor.pop_integer()?;
    let s = processor.pop_string()?;
    processor.push(Token::new_string(substring(&s, start, len), None));
    Ok(())
}

/// Returns the substring selected by a 1-based start and a length, counting characters.
pub(crate) fn substring(s: &str, start: i64, len: i64) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    if len <= 0 || start == 0 || start.unsigned_abs() > n as u64 {
        return String::new();
    }
    let (first, last) = if start > 0 {
        (start, start.saturating_add(len - 1).min(n))
    } else {
        let last = n + start + 1;
        ((last - len + 1).max(1), last)
    };
    chars[(first - 1) as usize..last as usize].iter().collect()
}

/// Get the `quote$` built-in function.
pub fn get_quote() -> BuiltIn {
    BuiltIn::new(quote_fn).with_doc("Push a string containing a double quote")
}

fn quote_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    processor.push(Token::new_string("\"", None));
    Ok(())
}

/// Get the `add.period$` built-in function.
pub fn get_add_period() -> BuiltIn {
    BuiltIn::new(add_period_fn).with_doc(
        "Pop a string and push it with a period added, unless it is empty or already ends with a period, question mark or exclamation mark

Closing braces at the end of the string are ignored when looking for the final character.",
    )
}

fn add_period_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let s = processor.pop_string()?;
    let last = s.trim_end_matches('}').chars().last();
    let token = match last {
        None if s.is_empty() => Token::new_string(s, None),
        Some('.' | '?' | '!') => Token::new_string(s, None),
        _ => Token::new_string(format!["{s}."], None),
    };
    processor.push(token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib_testing::*;
    use std::collections::HashMap;

    fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
        HashMap::from([
            ("*", get_concatenate()),
            ("add.period$", get_add_period()),
            ("quote$", get_quote()),
            ("substring$", get_substring()),
        ])
    }

    #[test]
    fn substrings() {
        assert_eq!(substring("abcdef", 1, 3), "abc");
        assert_eq!(substring("abcdef", 3, 2), "cd");
        assert_eq!(substring("abcdef", 5, 10), "ef");
        assert_eq!(substring("abcdef", -1, 2), "ef");
        assert_eq!(substring("abcdef", -2, 3), "cde");
        assert_eq!(substring("abcdef", -6, 10), "a");
        assert_eq!(substring("abcdef", 0, 2), "");
        assert_eq!(substring("abcdef", 7, 2), "");
        assert_eq!(substring("abcdef", -7, 2), "");
        assert_eq!(substring("abcdef", 2, 0), "");
        assert_eq!(substring("abcdef", 2, i64::MAX), "bcdef");
    }

    #[test]
    fn quote() {
        let mut processor = Processor::new(built_in_functions());
        processor.call("quote$", None).unwrap();
        assert_eq!(processor.pop_string().unwrap().as_ref(), "\"");
    }

    test_suite![
        stack_tests(
            (concatenate, r#""ab" "cd" *"#, r#""abcd""#),
            (concatenate_empty, r#""" "cd" *"#, r#""cd""#),
            (substring_from_start, r#""abcdef" #2 #3 substring$"#, r#""bcd""#),
            (substring_from_end, r#""abcdef" #-1 #3 substring$"#, r#""def""#),
            (add_period, r#""Title" add.period$"#, r#""Title.""#),
            (add_period_after_braces, r#""{Title}" add.period$"#, r#""{Title}.""#),
            (add_period_existing, r#""Why?" add.period$"#, r#""Why?""#),
            (add_period_existing_in_braces, r#""{Really!}" add.period$"#, r#""{Really!}""#),
            (add_period_empty, r#""" add.period$"#, r#""""#),
        ),
        failure_tests(
            (concatenate_integer, r#""a" #1 *"#),
            (substring_missing_arguments, r#""abc" #1 substring$"#),
        ),
    ];
}
