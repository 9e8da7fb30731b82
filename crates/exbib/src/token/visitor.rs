//! Visitors over tokens.
//!
//! Most code in this crate matches on [Kind] directly.
//! The visitor interface exists for traversals that live outside the token module,
//!     like static checks over a program before it is run,
//!     so that they can be written without matching on the token kinds themselves.

use super::{Kind, LocatorField, Token, TokenList};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A traversal that handles each kind of token.
///
/// [Token::visit] calls exactly one of these methods, the one matching the token's kind.
pub trait TokenVisitor {
    type Output;

    fn visit_block(&mut self, token: &Token, list: &TokenList) -> Self::Output;
    fn visit_char(&mut self, token: &Token, c: char) -> Self::Output;
    fn visit_field(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_empty_field(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_integer(&mut self, token: &Token, value: i64) -> Self::Output;
    fn visit_literal(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_local_integer(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_local_locator(
        &mut self,
        token: &Token,
        name: &str,
        field: LocatorField,
    ) -> Self::Output;
    fn visit_local_string(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_qliteral(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_string(&mut self, token: &Token, value: Option<&str>) -> Self::Output;
    fn visit_string_option(&mut self, token: &Token, name: &str) -> Self::Output;
    fn visit_token_list(&mut self, token: &Token, list: &TokenList) -> Self::Output;
}

impl Token {
    /// Dispatches this token to the visitor method for its kind.
    pub fn visit<V: TokenVisitor>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            Kind::Block(list) => visitor.visit_block(self, list),
            Kind::Char(c) => visitor.visit_char(self, *c),
            Kind::Field(name) => visitor.visit_field(self, name),
            Kind::EmptyField(name) => visitor.visit_empty_field(self, name),
            Kind::Integer(i) => visitor.visit_integer(self, i.value()),
            Kind::Literal(name) => visitor.visit_literal(self, name),
            Kind::LocalInteger(name) => visitor.visit_local_integer(self, name),
            Kind::LocalLocator(name, field) => visitor.visit_local_locator(self, name, *field),
            Kind::LocalString(name) => visitor.visit_local_string(self, name),
            Kind::QLiteral(name) => visitor.visit_qliteral(self, name),
            Kind::String(value) => visitor.visit_string(self, value.as_deref()),
            Kind::StringOption(name) => visitor.visit_string_option(self, name),
            Kind::TokenList(list) => visitor.visit_token_list(self, list),
        }
    }
}

/// Collects the names of every function a program refers to.
///
/// Both called literals (`abc`) and quoted literals (`'abc`) count as references.
/// Blocks and nested token lists are searched recursively.
#[derive(Default, Debug)]
pub struct FunctionReferences {
    names: BTreeSet<Arc<str>>,
}

impl FunctionReferences {
    /// Returns the references found in the provided list.
    pub fn of(list: &TokenList) -> FunctionReferences {
        let mut references = FunctionReferences::default();
        for token in list {
            token.visit(&mut references);
        }
        references
    }

    /// The referenced names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_ref())
    }

    fn visit_list(&mut self, list: &TokenList) {
        for token in list {
            token.visit(self);
        }
    }

    fn add(&mut self, token: &Token) {
        if let Kind::Literal(name) | Kind::QLiteral(name) = token.kind() {
            self.names.insert(name.clone());
        }
    }
}

impl TokenVisitor for FunctionReferences {
    type Output = ();

    fn visit_block(&mut self, _: &Token, list: &TokenList) {
        self.visit_list(list)
    }
    fn visit_char(&mut self, _: &Token, _: char) {}
    fn visit_field(&mut self, _: &Token, _: &str) {}
    fn visit_empty_field(&mut self, _: &Token, _: &str) {}
    fn visit_integer(&mut self, _: &Token, _: i64) {}
    fn visit_literal(&mut self, token: &Token, _: &str) {
        self.add(token)
    }
    fn visit_local_integer(&mut self, _: &Token, _: &str) {}
    fn visit_local_locator(&mut self, _: &Token, _: &str, _: LocatorField) {}
    fn visit_local_string(&mut self, _: &Token, _: &str) {}
    fn visit_qliteral(&mut self, token: &Token, _: &str) {
        self.add(token)
    }
    fn visit_string(&mut self, _: &Token, _: Option<&str>) {}
    fn visit_string_option(&mut self, _: &Token, _: &str) {}
    fn visit_token_list(&mut self, _: &Token, list: &TokenList) {
        self.visit_list(list)
    }
}
