//! Functions that measure and filter text
//!
//! BibTeX text is made of characters, brace groups and special characters.
//! A special character is a brace group at depth 0 that starts with a backslash,
//!     like `{\'e}` or `{\ss}`;
//!     it counts as a single character.
//! Braces of ordinary groups are not characters at all.

use exbib::code::BuiltIn;
use exbib::prelude::*;

/// Control sequences that stand for foreign letters.
pub(crate) const FOREIGN_LETTERS: [&str; 13] = [
    "i", "j", "oe", "OE", "ae", "AE", "aa", "AA", "o", "O", "l", "L", "ss",
];

/// A unit of BibTeX text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit<'a> {
    /// A character, together with the brace depth it appears at.
    Char { c: char, depth: usize },
    /// An opening brace; the depth is that of the group it opens.
    Open { depth: usize },
    /// A closing brace; the depth is that of the group it closes.
    Close { depth: usize },
    /// A special character, including its braces.
    Special(&'a str),
}

/// Iterator over the units of a piece of text.
pub(crate) struct Units<'a> {
    s: &'a str,
    position: usize,
    depth: usize,
}

pub(crate) fn units(s: &str) -> Units<'_> {
    Units {
        s,
        position: 0,
        depth: 0,
    }
}

impl<'a> Units<'a> {
    /// Byte offset of the next unit.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Number of groups that are open before the next unit.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl<'a> Iterator for Units<'a> {
    type Item = Unit<'a>;

    fn next(&mut self) -> Option<Unit<'a>> {
        let rest = &self.s[self.position..];
        let c = rest.chars().next()?;
        let unit = match c {
            '{' if self.depth == 0 && rest[1..].starts_with('\\') => {
                let len = group_len(rest);
                self.position += len;
                return Some(Unit::Special(&rest[..len]));
            }
            '{' => {
                self.depth += 1;
                Unit::Open { depth: self.depth }
            }
            '}' if self.depth > 0 => {
                self.depth -= 1;
                Unit::Close {
                    depth: self.depth + 1,
                }
            }
            _ => Unit::Char {
                c,
                depth: self.depth,
            },
        };
        self.position += c.len_utf8();
        Some(unit)
    }
}

/// Length in bytes of the brace group at the start of the text.
///
/// An unbalanced group extends to the end of the text.
pub(crate) fn group_len(s: &str) -> usize {
    let mut depth = 0_usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    s.len()
}

/// A part of the inside of a special character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpecialPart<'a> {
    /// A control sequence name, without the backslash.
    ControlSequence(&'a str),
    Char(char),
}

pub(crate) fn special_parts(special: &str) -> Vec<SpecialPart<'_>> {
    let inner = special.strip_prefix('{').unwrap_or(special);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    let mut parts = vec![];
    let mut chars = inner.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            parts.push(SpecialPart::Char(c));
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while let Some(&(j, d)) = chars.peek() {
            if !d.is_alphabetic() {
                break;
            }
            end = j + d.len_utf8();
            chars.next();
        }
        if end == start {
            // A control symbol like `\'`.
            if let Some((j, d)) = chars.next() {
                end = j + d.len_utf8();
            }
        }
        parts.push(SpecialPart::ControlSequence(&inner[start..end]));
    }
    parts
}

/// Returns whether the special character is lower case, or [None] if it contains no letter.
pub(crate) fn special_is_lowercase(special: &str) -> Option<bool> {
    for part in special_parts(special) {
        match part {
            SpecialPart::ControlSequence(name) if FOREIGN_LETTERS.contains(&name) => {
                return name.chars().next().map(char::is_lowercase)
            }
            SpecialPart::Char(c) if c.is_alphabetic() => return Some(c.is_lowercase()),
            _ => {}
        }
    }
    None
}

/// Number of characters in the text.
pub(crate) fn text_length(s: &str) -> usize {
    units(s)
        .filter(|unit| matches!(unit, Unit::Char { .. } | Unit::Special(_)))
        .count()
}

/// The first `n` characters of the text, with any groups left open closed.
pub(crate) fn text_prefix(s: &str, n: usize) -> String {
    let mut units = units(s);
    let mut count = 0;
    while count < n {
        match units.next() {
            None => break,
            Some(Unit::Char { .. } | Unit::Special(_)) => count += 1,
            Some(_) => {}
        }
    }
    let mut result = s[..units.position()].to_string();
    for _ in 0..units.depth() {
        result.push('}');
    }
    result
}

/// Removes everything but letters, digits and word separators from the text.
///
/// Whitespace, hyphens and ties become spaces.
/// Special characters keep the letters of foreign letter control sequences and their other letters.
pub(crate) fn purify(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for unit in units(s) {
        match unit {
            Unit::Char { c, .. } if c.is_alphanumeric() => result.push(c),
            Unit::Char { c, .. } if c.is_whitespace() || c == '-' || c == '~' => result.push(' '),
            Unit::Special(special) => {
                for part in special_parts(special) {
                    match part {
                        SpecialPart::ControlSequence(name) if FOREIGN_LETTERS.contains(&name) => {
                            result.push_str(name)
                        }
                        SpecialPart::Char(c) if c.is_alphanumeric() => result.push(c),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    result
}

/// Width of the text set in cmr10, in hundredths of a point.
pub(crate) fn width(s: &str) -> i64 {
    units(s)
        .map(|unit| match unit {
            Unit::Char { c, .. } => char_width(c),
            Unit::Open { .. } => char_width('{'),
            Unit::Close { .. } => char_width('}'),
            Unit::Special(special) => special_width(special),
        })
        .sum()
}

fn special_width(special: &str) -> i64 {
    let mut width = 0;
    let mut after_control_word = false;
    for part in special_parts(special) {
        match part {
            SpecialPart::ControlSequence(name) => {
                width += match name {
                    "ss" => 500,
                    "ae" => 722,
                    "oe" => 778,
                    "AE" => 903,
                    "OE" => 1014,
                    _ if FOREIGN_LETTERS.contains(&name) => {
                        name.chars().next().map(char_width).unwrap_or_default()
                    }
                    _ => 0,
                };
                after_control_word = name.chars().all(char::is_alphabetic);
            }
            SpecialPart::Char(c) if c.is_whitespace() && after_control_word => {}
            SpecialPart::Char('{' | '}') => after_control_word = false,
            SpecialPart::Char(c) => {
                width += char_width(c);
                after_control_word = false;
            }
        }
    }
    width
}

fn char_width(c: char) -> i64 {
    match c {
        ' ' | '!' | '\'' | ',' | '.' | ':' | ';' | '<' | '[' | ']' | '_' | '`' => 278,
        '"' | '$' | '*' | '/' | '^' | '\\' | '{' | '}' | '~' | '0'..='9' => 500,
        '#' | '%' => 833,
        '&' | '+' | '=' | '@' => 778,
        '(' | ')' => 389,
        '-' => 333,
        '>' | '?' => 472,
        '|' => 1000,
        'A' | 'H' | 'N' | 'U' | 'V' | 'X' | 'Y' => 750,
        'B' => 708,
        'C' | 'T' => 722,
        'D' => 764,
        'E' | 'P' => 681,
        'F' => 653,
        'G' => 785,
        'I' => 361,
        'J' => 514,
        'K' | 'O' | 'Q' => 778,
        'L' => 625,
        'M' => 917,
        'R' => 736,
        'S' => 556,
        'W' => 1028,
        'Z' => 611,
        'a' | 'g' | 'o' => 500,
        'b' | 'd' | 'h' | 'n' | 'p' | 'u' => 556,
        'c' | 'e' | 'z' => 444,
        'f' | 'j' => 306,
        'i' | 'l' => 278,
        'k' | 'q' | 'v' | 'x' | 'y' => 528,
        'm' => 833,
        'r' => 392,
        's' => 394,
        't' => 389,
        'w' => 722,
        _ => 0,
    }
}

/// Get the `text.length$` built-in function.
pub fn get_text_length() -> BuiltIn {
    BuiltIn::new(text_length_fn).with_doc(
        "Pop a string and push its number of characters; special characters count as one and braces are not counted",
    )
}

fn text_length_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let s = processor.pop_string()?;
    let length = i64::try_from(text_length(&s)).unwrap_or(i64::MAX);
    processor.push(Token::new_integer(length, None));
    Ok(())
}

/// Get the `text.prefix$` built-in function.
pub fn get_text_prefix() -> BuiltIn {
    BuiltIn::new(text_prefix_fn)
        .with_doc("Pop an integer n and a string; push the first n characters of the string")
}

fn text_prefix_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let n = processor.pop_integer()?;
    let s = processor.pop_string()?;
    let prefix = match usize::try_from(n) {
        Ok(n) => text_prefix(&s, n),
        Err(_) => String::new(),
    };
    processor.push(Token::new_string(prefix, None));
    Ok(())
}

/// Get the `purify$` built-in function.
pub fn get_purify() -> BuiltIn {
    BuiltIn::new(purify_fn).with_doc(
        "Pop a string and push it with everything but letters, digits and separators removed",
    )
}

fn purify_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let s = processor.pop_string()?;
    processor.push(Token::new_string(purify(&s), None));
    Ok(())
}

/// Get the `width$` built-in function.
pub fn get_width() -> BuiltIn {
    BuiltIn::new(width_fn).with_doc("Pop a string and push its width in cmr10 units")
}

fn width_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let s = processor.pop_string()?;
    processor.push(Token::new_integer(width(&s), None));
    Ok(())
}
