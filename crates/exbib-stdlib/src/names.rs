//! Splitting and formatting lists of personal names
//!
//! A list of names is separated by the word `and` at brace depth 0.
//! Each name has four parts: First, von, Last and Jr, written in one of these forms:
//!
//! - `First von Last`
//! - `von Last, First`
//! - `von Last, Jr, First`
//!
//! Words are separated by whitespace, hyphens and ties at brace depth 0.
//! A word belongs to the von part if its first letter is lowercase.

use crate::text::{self, group_len, special_is_lowercase, Unit};
use exbib::code::BuiltIn;
use exbib::error::Error;
use exbib::prelude::*;

const FORMAT_NAME: &str = "format.name$";

/// Splits a list of names at the word `and`.
///
/// The word is matched case insensitively and only when it is surrounded by whitespace.
/// Text of only whitespace has no names.
pub(crate) fn split_names(s: &str) -> Vec<&str> {
    let mut names = vec![];
    if s.trim().is_empty() {
        return names;
    }
    let mut name_start = 0;
    let mut word_start: Option<usize> = None;
    let mut units = text::units(s);
    loop {
        let position = units.position();
        let unit = units.next();
        let at_word_end = match unit {
            None => true,
            Some(Unit::Char { c, depth: 0 }) if c.is_whitespace() => true,
            Some(_) => {
                word_start.get_or_insert(position);
                false
            }
        };
        if !at_word_end {
            continue;
        }
        if let Some(start) = word_start.take() {
            if unit.is_some() && start > 0 && s[start..position].eq_ignore_ascii_case("and") {
                names.push(s[name_start..start].trim());
                name_start = position;
            }
        }
        if unit.is_none() {
            break;
        }
    }
    names.push(s[name_start..].trim());
    names
}

/// A word of a name together with the separator that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Word<'a> {
    text: &'a str,
    /// `-` or `~` if the word is followed by one of those, a space otherwise.
    sep: char,
}

/// The parts of a name.
#[derive(Debug, Default, PartialEq, Eq)]
struct Name<'a> {
    first: Vec<Word<'a>>,
    von: Vec<Word<'a>>,
    last: Vec<Word<'a>>,
    jr: Vec<Word<'a>>,
}

/// Splits a name into comma separated parts of words.
fn split_words(name: &str) -> Vec<Vec<Word<'_>>> {
    let mut parts = vec![];
    let mut current = vec![];
    let mut word_start: Option<usize> = None;
    let mut units = text::units(name);
    loop {
        let position = units.position();
        let Some(unit) = units.next() else {
            break;
        };
        let separator = match unit {
            Unit::Char { c, depth: 0 } if c.is_whitespace() || matches!(c, '-' | '~' | ',') => c,
            _ => {
                word_start.get_or_insert(position);
                continue;
            }
        };
        if let Some(start) = word_start.take() {
            current.push(Word {
                text: &name[start..position],
                sep: if matches!(separator, '-' | '~') {
                    separator
                } else {
                    ' '
                },
            });
        }
        if separator == ',' {
            parts.push(std::mem::take(&mut current));
        }
    }
    if let Some(start) = word_start {
        current.push(Word {
            text: &name[start..],
            sep: ' ',
        });
    }
    parts.push(current);
    parts
}

/// Returns whether the word starts with a lowercase letter.
///
/// Ordinary brace groups are skipped; a special character counts as its letter.
fn is_von(word: &str) -> bool {
    for unit in text::units(word) {
        match unit {
            Unit::Char { c, depth: 0 } if c.is_alphabetic() => return c.is_lowercase(),
            Unit::Special(special) => {
                if let Some(lowercase) = special_is_lowercase(special) {
                    return lowercase;
                }
            }
            _ => {}
        }
    }
    false
}

/// Number of leading words that form the von part.
///
/// The von part ends with the last von word before the final word.
fn von_len(words: &[Word]) -> usize {
    (0..words.len().saturating_sub(1))
        .rev()
        .find(|&i| is_von(words[i].text))
        .map_or(0, |i| i + 1)
}

fn parse_name<'a>(name: &'a str, locator: Option<&Locator>) -> Result<Name<'a>> {
    let mut parts = split_words(name);
    let mut result = Name::default();
    match parts.len() {
        1 => {
            let words = parts.remove(0);
            let n = words.len();
            if n == 0 {
                return Ok(result);
            }
            match (0..n - 1).find(|&i| is_von(words[i].text)) {
                Some(von_start) => {
                    let k = von_start + von_len(&words[von_start..]);
                    result.first = words[..von_start].to_vec();
                    result.von = words[von_start..k].to_vec();
                    result.last = words[k..].to_vec();
                }
                None => {
                    result.first = words[..n - 1].to_vec();
                    result.last = words[n - 1..].to_vec();
                }
            }
        }
        2 | 3 => {
            let von_last = &parts[0];
            let k = von_len(von_last);
            result.von = von_last[..k].to_vec();
            result.last = von_last[k..].to_vec();
            if parts.len() == 3 {
                result.jr = parts[1].clone();
            }
            result.first = parts[parts.len() - 1].clone();
        }
        _ => {
            return Err(Error::invalid_argument(
                FORMAT_NAME,
                format!["too many commas in the name \"{name}\""],
                locator,
            ))
        }
    }
    Ok(result)
}

/// Which part of a name a format group prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    First,
    Von,
    Last,
    Jr,
}

impl Part {
    fn parse(c: char) -> Option<Part> {
        match c {
            'f' => Some(Part::First),
            'v' => Some(Part::Von),
            'l' => Some(Part::Last),
            'j' => Some(Part::Jr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// Text outside of groups, copied to the output.
    Text(&'a str),
    /// A group like `{, jj}`, printed only if its part of the name is not empty.
    Part {
        pre: &'a str,
        part: Part,
        /// Whether words are printed in full rather than abbreviated.
        full: bool,
        /// Replaces the default separator between words.
        sep: Option<&'a str>,
        post: &'a str,
    },
}

fn parse_format<'a>(format: &'a str, locator: Option<&Locator>) -> Result<Vec<Segment<'a>>> {
    let mut segments = vec![];
    let mut rest = format;
    while let Some(i) = rest.find('{') {
        if i > 0 {
            segments.push(Segment::Text(&rest[..i]));
        }
        let len = group_len(&rest[i..]);
        segments.push(parse_group(&rest[i..i + len], format, locator)?);
        rest = &rest[i + len..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

fn parse_group<'a>(group: &'a str, format: &str, locator: Option<&Locator>) -> Result<Segment<'a>> {
    let inner = &group[1..];
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    let mut depth = 0_usize;
    let mut letter = None;
    for (i, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_alphabetic() => {
                letter = Some((i, c));
                break;
            }
            _ => {}
        }
    }
    let Some((i, c)) = letter else {
        return Ok(Segment::Text(group));
    };
    let Some(part) = Part::parse(c) else {
        return Err(Error::invalid_argument(
            FORMAT_NAME,
            format!["illegal name format \"{format}\": `{c}` is not one of f, v, l or j"],
            locator,
        ));
    };
    let pre = &inner[..i];
    let mut rest = &inner[i + c.len_utf8()..];
    let full = rest.starts_with(c);
    if full {
        rest = &rest[c.len_utf8()..];
    }
    let mut sep = None;
    if rest.starts_with('{') {
        let len = group_len(rest);
        let override_group = &rest[1..len];
        sep = Some(override_group.strip_suffix('}').unwrap_or(override_group));
        rest = &rest[len..];
    }
    Ok(Segment::Part {
        pre,
        part,
        full,
        sep,
        post: rest,
    })
}

/// The first letter of the word, as printed in abbreviated names.
///
/// A special character or an ordinary brace group in front is kept whole.
fn abbreviate(word: &str) -> &str {
    let mut units = text::units(word);
    loop {
        let start = units.position();
        match units.next() {
            None => return "",
            Some(Unit::Char { c, depth: 0 }) if c.is_alphabetic() => {
                return &word[start..start + c.len_utf8()]
            }
            Some(Unit::Special(special)) => return special,
            Some(Unit::Open { depth: 1 }) => return &word[start..start + group_len(&word[start..])],
            Some(_) => {}
        }
    }
}

/// Minimum number of characters a group must have printed for a space to replace a tie.
const LONG_ENOUGH: usize = 3;

fn format_words(out: &mut String, words: &[Word], pre: &str, full: bool, sep: Option<&str>, post: &str) {
    let group_start = out.len();
    out.push_str(pre);
    for (i, word) in words.iter().enumerate() {
        out.push_str(if full { word.text } else { abbreviate(word.text) });
        if i + 1 == words.len() {
            break;
        }
        if let Some(sep) = sep {
            out.push_str(sep);
            continue;
        }
        if !full {
            out.push('.');
        }
        let tie = i + 2 == words.len() || text::text_length(&out[group_start..]) < LONG_ENOUGH;
        out.push(match word.sep {
            '-' | '~' => word.sep,
            _ if tie => '~',
            _ => ' ',
        });
    }
    if let Some(post) = post.strip_suffix("~~") {
        out.push_str(post);
        out.push('~');
    } else if let Some(post) = post.strip_suffix('~') {
        out.push_str(post);
        let long = text::text_length(&out[group_start..]) >= LONG_ENOUGH;
        out.push(if long { ' ' } else { '~' });
    } else {
        out.push_str(post);
    }
}

/// Formats a single name.
pub(crate) fn format_name(name: &str, format: &str, locator: Option<&Locator>) -> Result<String> {
    let name = parse_name(name, locator)?;
    let mut out = String::new();
    for segment in parse_format(format, locator)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Part {
                pre,
                part,
                full,
                sep,
                post,
            } => {
                let words = match part {
                    Part::First => &name.first,
                    Part::Von => &name.von,
                    Part::Last => &name.last,
                    Part::Jr => &name.jr,
                };
                if !words.is_empty() {
                    format_words(&mut out, words, pre, full, sep, post);
                }
            }
        }
    }
    Ok(out)
}

/// Get the `num.names$` built-in function.
pub fn get_num_names() -> BuiltIn {
    BuiltIn::new(num_names_fn).with_doc("Pop a list of names and push the number of names in it")
}

fn num_names_fn(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
    let names = processor.pop_string()?;
    let n = split_names(&names).len();
    processor.push(Token::new_integer(n as i64, None));
    Ok(())
}

/// Get the `format.name$` built-in function.
pub fn get_format_name() -> BuiltIn {
    BuiltIn::new(format_name_fn).with_doc(
        "Pop a format, an index and a list of names; push the name at the index, formatted

The index starts at 1.
In the format, a brace group prints one part of the name: `f` First, `v` von, `l` Last, `j` Jr.
A doubled letter prints the words in full, a single letter abbreviates them.
A group whose part is empty prints nothing.
For example `{ff~}{vv~}{ll}{, jj}` prints `Donald~E. Knuth`.",
    )
}

fn format_name_fn(processor: &mut Processor, _: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let format = processor.pop_string()?;
    let index = processor.pop_integer()?;
    let names = processor.pop_string()?;
    let list = split_names(&names);
    let name = usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| list.get(i));
    let Some(name) = name else {
        return Err(Error::invalid_argument(
            FORMAT_NAME,
            format!["there is no name {index} in \"{names}\""],
            locator,
        ));
    };
    let formatted = format_name(name, &format, locator)?;
    processor.push(Token::new_string(formatted, None));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib::error;
    use exbib_testing::*;
    use std::collections::HashMap;

    fn words<'a>(name: &Name<'a>) -> [Vec<&'a str>; 4] {
        [&name.first, &name.von, &name.last, &name.jr]
            .map(|part| part.iter().map(|word| word.text).collect())
    }

    #[test]
    fn split_names_at_and() {
        assert_eq!(
            split_names("Donald E. Knuth and Leslie Lamport"),
            vec!["Donald E. Knuth", "Leslie Lamport"]
        );
        assert_eq!(split_names("A AND B and C"), vec!["A", "B", "C"]);
        assert_eq!(split_names("Barnes {and} Noble"), vec!["Barnes {and} Noble"]);
        assert_eq!(split_names("Sand and Andrews"), vec!["Sand", "Andrews"]);
        assert_eq!(split_names("and Knuth"), vec!["and Knuth"]);
        assert_eq!(split_names("Knuth and"), vec!["Knuth and"]);
        assert!(split_names("  ").is_empty());
    }

    #[test]
    fn parse_first_von_last() {
        let name = parse_name("Charles Louis Xavier Joseph de la Vallée Poussin", None).unwrap();
        assert_eq!(
            words(&name),
            [
                vec!["Charles", "Louis", "Xavier", "Joseph"],
                vec!["de", "la"],
                vec!["Vallée", "Poussin"],
                vec![],
            ]
        );
    }

    #[test]
    fn parse_last_word_is_never_von() {
        let name = parse_name("Donald knuth", None).unwrap();
        assert_eq!(
            words(&name),
            [vec!["Donald"], vec![], vec!["knuth"], vec![]]
        );
    }

    #[test]
    fn parse_von_last_jr_first() {
        let name = parse_name("van der Waals, Jr., Johannes Diderik", None).unwrap();
        assert_eq!(
            words(&name),
            [
                vec!["Johannes", "Diderik"],
                vec!["van", "der"],
                vec!["Waals"],
                vec!["Jr."],
            ]
        );
    }

    #[test]
    fn parse_special_character_von() {
        let name = parse_name("Jos{\\'e} {\\'a}lvarez Ruiz", None).unwrap();
        assert_eq!(
            words(&name),
            [vec!["Jos{\\'e}"], vec!["{\\'a}lvarez"], vec!["Ruiz"], vec![]]
        );
    }

    #[test]
    fn parse_records_separators() {
        let name = parse_name("Jean-Pierre~Serre", None).unwrap();
        assert_eq!(
            name.first,
            vec![
                Word {
                    text: "Jean",
                    sep: '-'
                },
                Word {
                    text: "Pierre",
                    sep: '~'
                },
            ]
        );
    }

    #[test]
    fn too_many_commas() {
        let err = parse_name("a, b, c, d", None).unwrap_err();
        assert!(matches!(
            err.kind(),
            error::Kind::InvalidArgument {
                function: FORMAT_NAME,
                ..
            }
        ));
    }

    #[test]
    fn abbreviations() {
        assert_eq!(abbreviate("Donald"), "D");
        assert_eq!(abbreviate("{\\'E}mile"), "{\\'E}");
        assert_eq!(abbreviate("{Ch}ristian"), "{Ch}");
        assert_eq!(abbreviate("(Tom)"), "T");
        assert_eq!(abbreviate("123"), "");
    }

    #[test]
    fn format_examples() {
        let cases = [
            ("Donald E. Knuth", "{ff~}{vv~}{ll}{, jj}", "Donald~E. Knuth"),
            ("Donald Ervin Knuth", "{f.~}{vv~}{ll}{, jj}", "D.~E. Knuth"),
            ("Donald Knuth", "{f.~}{ll}", "D.~Knuth"),
            ("Donald Knuth", "{ff~~}{ll}", "Donald~Knuth"),
            ("Ludwig van Beethoven", "{vv~}{ll}", "van Beethoven"),
            (
                "de la Vallée Poussin, Charles Louis Xavier Joseph",
                "{vv~}{ll}{, ff}",
                "de~la Vallée~Poussin, Charles Louis Xavier~Joseph",
            ),
            ("Ford, Jr., Henry", "{ff }{vv }{ll}{, jj}", "Henry Ford, Jr."),
            ("Jean-Pierre Serre", "{f.~}{ll}", "J.-P. Serre"),
            ("{\\'E}mile Zola", "{f.~}{ll}", "{\\'E}.~Zola"),
            ("{Barnes and Noble}", "{ff }{ll}", "{Barnes and Noble}"),
            ("Donald Ervin Knuth", "{f{}}", "DE"),
            ("Donald Knuth", "[{ll}]", "[Knuth]"),
            ("Donald Knuth", "{ll}, {f.}", "Knuth, D."),
            ("Donald Knuth", "{ll}{ {}}", "Knuth{ {}}"),
        ];
        for (name, format, expected) in cases {
            assert_eq!(
                format_name(name, format, None).unwrap(),
                expected,
                "name {name:?} with format {format:?}"
            );
        }
    }

    #[test]
    fn illegal_format_letter() {
        let err = format_name("Donald Knuth", "{x}", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::InvalidArgument { .. }));
    }

    fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
        HashMap::from([
            ("format.name$", get_format_name()),
            ("num.names$", get_num_names()),
        ])
    }

    test_suite![
        stack_tests(
            (num_names_two, r#""Donald E. Knuth and Leslie Lamport" num.names$"#, "#2"),
            (num_names_braced_and, r#""Barnes {and} Noble" num.names$"#, "#1"),
            (num_names_empty, r#""" num.names$"#, "#0"),
            (
                format_second_name,
                r#""Knuth and Lamport, Leslie" #2 "{ff }{ll}" format.name$"#,
                r#""Leslie Lamport""#
            ),
            (
                format_first_name,
                r#""Donald E. Knuth and Leslie Lamport" #1 "{ff~}{vv~}{ll}{, jj}" format.name$"#,
                r#""Donald~E. Knuth""#
            ),
        ),
        failure_tests(
            (format_index_too_large, r#""A and B" #3 "{ll}" format.name$"#),
            (format_index_zero, r#""A" #0 "{ll}" format.name$"#),
            (format_no_names, r#""" #1 "{ll}" format.name$"#),
            (format_integer_format, r#""A" #1 #1 format.name$"#),
            (num_names_integer, "#1 num.names$"),
        ),
    ];
}
