//! Tokens of compiled `.bst` programs.
//!
//! A compiled program is a sequence of [Tokens](Token).
//! Each token supports two operations:
//!
//! - [execute](Token::execute) runs the token against a [Processor]:
//!     most tokens push a value onto the operand stack,
//!     while literals call the function they name.
//!
//! - [expand](Token::expand) renders the token to text without touching the stack.
//!     This is used when a token contributes literal text, for example inside macros.
//!
//! The canonical textual form of each token is given by its [Display](std::fmt::Display) implementation.
//! These forms appear in traces and in the output of `stack$`, so they are stable:
//!
//! | kind | example | form |
//! | --- | --- | --- |
//! | integer | `#-42` | `#` followed by the decimal value |
//! | string | `"The Bible"` | the text in double quotes, not escaped |
//! | block | `{abc #1}` | children separated by spaces in braces |
//! | quoted literal | `'abc` | a single leading quote |
//! | token list | `abc #1` | children separated by spaces |

use crate::entry::Entry;
use crate::error::{self, Error};
use crate::prelude::*;
use crate::processor::Processor;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

mod list;
mod locator;
pub mod visitor;

pub use list::TokenList;
pub use locator::{Locator, LocatorField};

/// Name of the one field whose value is lower-cased when read.
const CROSSREF: &str = "crossref";

/// An integer literal.
///
/// The canonical text of the integer is computed when it is constructed.
/// Only the value is serialized; the text is recomputed on deserialization.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i64", into = "i64"))]
pub struct Integer {
    value: i64,
    text: Arc<str>,
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Integer {}

impl Hash for Integer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::new(value)
    }
}

impl From<Integer> for i64 {
    fn from(integer: Integer) -> Self {
        integer.value
    }
}

impl Integer {
    fn new(value: i64) -> Integer {
        Integer {
            value,
            text: format!("#{value}").into(),
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// The canonical text of the integer, e.g. `#-42`.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The kind of a token, together with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// A braced sequence of tokens that is pushed as a single unit.
    Block(TokenList),
    /// A single character; used transiently while parsing.
    Char(char),
    /// A reference to a field of the current entry.
    Field(Arc<str>),
    /// The value pushed when a referenced field is absent from the current entry.
    EmptyField(Arc<str>),
    Integer(Integer),
    /// A reference to a function, which is called on execution.
    Literal(Arc<str>),
    /// A reference to an integer variable of the current entry.
    LocalInteger(Arc<str>),
    /// A reference to the locator of the current entry.
    LocalLocator(Arc<str>, LocatorField),
    /// A reference to a string variable of the current entry.
    LocalString(Arc<str>),
    /// A quoted reference to a function, which pushes the literal on execution.
    QLiteral(Arc<str>),
    /// A string; [None] represents a null string, which is distinct from the empty string.
    String(Option<Arc<str>>),
    /// A reference to a named string option of the processor.
    StringOption(Arc<str>),
    /// A sequence of tokens that is executed in place.
    TokenList(TokenList),
}

/// A token in a compiled `.bst` program, or a value on the operand stack.
///
/// Two tokens are equal if their kinds and payloads are equal; locators are ignored.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    kind: Kind,
    locator: Option<Locator>,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state)
    }
}

fn require_function_name(name: &str, locator: Option<&Locator>) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(error::Kind::EmptyFunctionName, locator));
    }
    Ok(())
}

impl Token {
    fn new(kind: Kind, locator: Option<Locator>) -> Token {
        Token { kind, locator }
    }

    pub fn new_block(list: TokenList, locator: Option<Locator>) -> Token {
        Token::new(Kind::Block(list), locator)
    }

    pub fn new_char(c: char, locator: Option<Locator>) -> Token {
        Token::new(Kind::Char(c), locator)
    }

    pub fn new_field<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::Field(name.into()), locator)
    }

    pub fn new_empty_field<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::EmptyField(name.into()), locator)
    }

    pub fn new_integer(value: i64, locator: Option<Locator>) -> Token {
        Token::new(Kind::Integer(Integer::new(value)), locator)
    }

    /// Creates an integer token from its textual form.
    ///
    /// The text is an optionally signed decimal number, optionally preceded by `#`.
    /// Text without any digits is a no number error;
    ///     text with other characters, or out of the 64-bit range, is an illegal value error.
    pub fn parse_integer(text: &str, locator: Option<Locator>) -> Result<Token> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        let unsigned = digits
            .strip_prefix('-')
            .or_else(|| digits.strip_prefix('+'))
            .unwrap_or(digits);
        if unsigned.is_empty() {
            return Err(Error::new(
                error::Kind::NoNumber { text: text.into() },
                locator.as_ref(),
            ));
        }
        match digits.parse::<i64>() {
            Ok(value) if unsigned.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(Token::new_integer(value, locator))
            }
            _ => Err(Error::new(
                error::Kind::IllegalValue { text: text.into() },
                locator.as_ref(),
            )),
        }
    }

    /// Creates a literal; the name must not be empty.
    pub fn new_literal<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Result<Token> {
        let name = name.into();
        require_function_name(&name, locator.as_ref())?;
        Ok(Token::new(Kind::Literal(name), locator))
    }

    pub fn new_local_integer<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::LocalInteger(name.into()), locator)
    }

    pub fn new_local_locator<T: Into<Arc<str>>>(
        name: T,
        field: LocatorField,
        locator: Option<Locator>,
    ) -> Token {
        Token::new(Kind::LocalLocator(name.into(), field), locator)
    }

    pub fn new_local_string<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::LocalString(name.into()), locator)
    }

    /// Creates a quoted literal; the name must not be empty.
    pub fn new_qliteral<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Result<Token> {
        let name = name.into();
        require_function_name(&name, locator.as_ref())?;
        Ok(Token::new(Kind::QLiteral(name), locator))
    }

    pub fn new_string<T: Into<Arc<str>>>(value: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::String(Some(value.into())), locator)
    }

    /// Creates a null string, which reads as empty but is distinguishable from `""`.
    pub fn new_null_string(locator: Option<Locator>) -> Token {
        Token::new(Kind::String(None), locator)
    }

    pub fn new_string_option<T: Into<Arc<str>>>(name: T, locator: Option<Locator>) -> Token {
        Token::new(Kind::StringOption(name.into()), locator)
    }

    pub fn new_token_list(list: TokenList, locator: Option<Locator>) -> Token {
        Token::new(Kind::TokenList(list), locator)
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Returns the integer value of an integer token.
    pub fn int_value(&self) -> Option<i64> {
        match &self.kind {
            Kind::Integer(i) => Some(i.value()),
            _ => None,
        }
    }

    /// Returns the text of a string-like token.
    ///
    /// Null strings and empty fields read as the empty string.
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            Kind::String(s) => Some(s.as_deref().unwrap_or("")),
            Kind::EmptyField(_) => Some(""),
            _ => None,
        }
    }

    /// Returns the field value that an integer or string-like token holds.
    ///
    /// Null strings and empty fields are [Value::Missing].
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            Kind::Integer(i) => Some(Value::Integer(i.value())),
            Kind::String(Some(s)) => Some(Value::String(s.to_string())),
            Kind::String(None) | Kind::EmptyField(_) => Some(Value::Missing),
            _ => None,
        }
    }

    /// Returns true for null strings and empty fields.
    pub fn is_null(&self) -> bool {
        matches!(&self.kind, Kind::String(None) | Kind::EmptyField(_))
    }

    /// Runs this token against the processor.
    ///
    /// The entry is the one currently being formatted, if any.
    /// The locator is that of the calling context and is used for diagnostics
    ///     when this token has no locator of its own.
    pub fn execute(
        &self,
        processor: &mut Processor,
        entry: Option<&Entry>,
        locator: Option<&Locator>,
    ) -> Result<()> {
        let locator = self.locator.as_ref().or(locator);
        match &self.kind {
            Kind::Block(_)
            | Kind::Char(_)
            | Kind::EmptyField(_)
            | Kind::Integer(_)
            | Kind::String(_) => {
                processor.step(self);
                processor.push(self.clone());
            }
            Kind::Field(name) => {
                let entry = require_entry(entry, locator)?;
                let token = match entry.resolve_field(name, processor.database()) {
                    Value::Missing => Token::new_empty_field(name.clone(), locator.cloned()),
                    Value::Integer(i) => Token::new_string(i.to_string(), locator.cloned()),
                    Value::String(s) if name.eq_ignore_ascii_case(CROSSREF) => {
                        Token::new_string(s.to_lowercase(), locator.cloned())
                    }
                    Value::String(s) => Token::new_string(s, locator.cloned()),
                };
                processor.step(&token);
                processor.push(token);
            }
            Kind::Literal(name) => {
                processor.call_at(name, entry, locator)?;
            }
            Kind::LocalInteger(name) => {
                let entry = require_entry(entry, locator)?;
                let token = Token::new_integer(entry.local_integer(name), locator.cloned());
                processor.step(&token);
                processor.push(token);
            }
            Kind::LocalLocator(_, field) => {
                let entry = require_entry(entry, locator)?;
                let token = Token::new_string(field.read(entry.locator()), locator.cloned());
                processor.step(&token);
                processor.push(token);
            }
            Kind::LocalString(name) => {
                let entry = require_entry(entry, locator)?;
                let token = Token::new_string(entry.local_string(name), locator.cloned());
                processor.step(&token);
                processor.push(token);
            }
            Kind::QLiteral(name) => {
                let token = Token::new(Kind::Literal(name.clone()), locator.cloned());
                processor.step(self);
                processor.push(token);
            }
            Kind::StringOption(name) => {
                let token = processor.get_option(name, T_EMPTY.get());
                processor.step(&token);
                processor.push(token);
            }
            Kind::TokenList(list) => {
                list.execute(processor, entry, locator)?;
            }
        }
        Ok(())
    }

    /// Renders this token to text without changing the processor's state.
    ///
    /// Literals and fields without a macro definition expand silently
    ///     (to the empty string and to their own name respectively),
    ///     whereas an empty field fails with an undefined field error.
    ///
    /// A string option expands to the expansion of its value,
    ///     in which string options are not resolved again and expand to their names.
    pub fn expand(&self, processor: &Processor) -> Result<String> {
        self.expand_with(processor, true)
    }

    fn expand_with(&self, processor: &Processor, resolve_options: bool) -> Result<String> {
        Ok(match &self.kind {
            Kind::Block(list) | Kind::TokenList(list) => list.expand_with(processor, resolve_options)?,
            Kind::Char(c) => c.to_string(),
            Kind::Field(name) => match processor.get_macro(name) {
                Some(text) => text.to_string(),
                None => name.to_string(),
            },
            Kind::EmptyField(name) => {
                return Err(Error::new(
                    error::Kind::UndefinedField {
                        name: name.to_string(),
                    },
                    self.locator(),
                ))
            }
            Kind::Integer(i) => i.value().to_string(),
            Kind::Literal(name) => processor.get_macro(name).unwrap_or_default().to_string(),
            Kind::LocalInteger(name)
            | Kind::LocalLocator(name, _)
            | Kind::LocalString(name)
            | Kind::QLiteral(name) => name.to_string(),
            Kind::String(value) => value.as_deref().unwrap_or_default().to_string(),
            Kind::StringOption(name) if resolve_options => processor
                .get_option(name, T_EMPTY.get())
                .expand_with(processor, false)?,
            Kind::StringOption(name) => name.to_string(),
        })
    }
}

fn require_entry<'a>(entry: Option<&'a Entry>, locator: Option<&Locator>) -> Result<&'a Entry> {
    entry.ok_or_else(|| Error::new(error::Kind::MissingEntry, locator))
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Block(list) => write!(f, "{{{list}}}"),
            Kind::Char(c) => write!(f, "{c}"),
            Kind::Field(name)
            | Kind::EmptyField(name)
            | Kind::Literal(name)
            | Kind::LocalInteger(name)
            | Kind::LocalLocator(name, _)
            | Kind::LocalString(name)
            | Kind::StringOption(name) => write!(f, "{name}"),
            Kind::Integer(i) => write!(f, "{}", i.text()),
            Kind::QLiteral(name) => write!(f, "'{name}"),
            Kind::String(value) => write!(f, "\"{}\"", value.as_deref().unwrap_or_default()),
            Kind::TokenList(list) => write!(f, "{list}"),
        }
    }
}

/// A token that is built on first use and then shared for the lifetime of the program.
///
/// Static tokens are never mutated.
/// ```
/// # use exbib::token::{StaticToken, Token};
/// static SEVEN: StaticToken = StaticToken::new(|| Token::new_integer(7, None));
/// assert_eq!(SEVEN.get().int_value(), Some(7));
/// ```
pub struct StaticToken {
    cell: OnceLock<Token>,
    init: fn() -> Token,
}

impl StaticToken {
    pub const fn new(init: fn() -> Token) -> StaticToken {
        StaticToken {
            cell: OnceLock::new(),
            init,
        }
    }

    pub fn get(&self) -> &Token {
        self.cell.get_or_init(self.init)
    }
}

fn zero() -> Token {
    Token::new_integer(0, None)
}

fn one() -> Token {
    Token::new_integer(1, None)
}

fn empty() -> Token {
    Token::new_string("", None)
}

/// The integer 0, which is also the boolean false.
pub static T_ZERO: StaticToken = StaticToken::new(zero);

/// The integer 1, which is also the boolean true.
pub static T_ONE: StaticToken = StaticToken::new(one);

/// The empty string.
pub static T_EMPTY: StaticToken = StaticToken::new(empty);
