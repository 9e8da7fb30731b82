//! Sequences of tokens.

use super::{Kind, Token};
use crate::entry::Entry;
use crate::error::{self, Error};
use crate::prelude::*;
use crate::processor::Processor;
use std::fmt;
use std::sync::Arc;

/// An immutable sequence of tokens.
///
/// Token lists are the bodies of user-defined functions and the contents of blocks.
/// They are cheap to clone: the tokens are shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenList(Arc<[Token]>);

impl TokenList {
    pub fn new(tokens: Vec<Token>) -> TokenList {
        TokenList(tokens.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.0
    }

    /// Executes every token of the list, in order.
    ///
    /// Execution stops at the first error.
    pub fn execute(
        &self,
        processor: &mut Processor,
        entry: Option<&Entry>,
        locator: Option<&Locator>,
    ) -> Result<()> {
        for token in self.iter() {
            token.execute(processor, entry, locator)?;
        }
        Ok(())
    }

    /// Concatenates the expansions of every token of the list.
    pub fn expand(&self, processor: &Processor) -> Result<String> {
        self.expand_with(processor, true)
    }

    pub(super) fn expand_with(&self, processor: &Processor, resolve_options: bool) -> Result<String> {
        let mut result = String::new();
        for token in self.iter() {
            result.push_str(&token.expand_with(processor, resolve_options)?);
        }
        Ok(result)
    }

    /// Returns the names of the literals in this list.
    ///
    /// Every token must be a literal, otherwise a missing literal error is returned.
    pub fn to_string_list(&self) -> Result<Vec<Arc<str>>> {
        self.iter()
            .map(|token| match token.kind() {
                Kind::Literal(name) => Ok(name.clone()),
                _ => Err(Error::new(
                    error::Kind::MissingLiteral {
                        found: token.to_string(),
                    },
                    token.locator(),
                )),
            })
            .collect()
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        TokenList::new(tokens)
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        TokenList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(name: &str) -> Token {
        Token::new_literal(name, None).unwrap()
    }

    #[test]
    fn display_is_space_joined() {
        let list = TokenList::new(vec![
            Token::new_integer(1, None),
            literal("abc"),
            Token::new_string("x", None),
        ]);
        assert_eq!(list.to_string(), r#"#1 abc "x""#);
        assert_eq!(TokenList::default().to_string(), "");
    }

    #[test]
    fn to_string_list() {
        let list = TokenList::new(vec![literal("author"), literal("title")]);
        let names = list.to_string_list().unwrap();
        let names: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
        assert_eq!(names, vec!["author", "title"]);
    }

    #[test]
    fn to_string_list_rejects_non_literals() {
        let list = TokenList::new(vec![literal("author"), Token::new_integer(3, None)]);
        let err = list.to_string_list().unwrap_err();
        assert!(matches!(err.kind(), error::Kind::MissingLiteral { .. }));
    }

    #[test]
    fn expand_concatenates() {
        let processor = Processor::new(Default::default());
        let list = TokenList::new(vec![
            Token::new_string("a", None),
            Token::new_integer(2, None),
            Token::new_char('c', None),
        ]);
        assert_eq!(list.expand(&processor).unwrap(), "a2c");
    }
}
