//! Functions of the ExBib processor.
//!
//! Every name that a `.bst` program can call is bound to [Code] in the processor's function table.
//! Code comes from three places:
//!
//! - Built-in functions like `write$` are Rust functions, provided when the
//!     processor is created. See the `exbib-stdlib` crate.
//!
//! - User functions are defined in the style file with `FUNCTION`;
//!     their bodies are [TokenLists](TokenList).
//!
//! - Variables declared with `ENTRY`, `INTEGERS` and `STRINGS` are bound to code
//!     that pushes the variable's current value.
//!
//! Binding a name that is already bound replaces the earlier code.
//! This is how style files override built-in functions.

use crate::entry::Entry;
use crate::prelude::*;
use crate::processor::Processor;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// The Rust type of built-in functions.
pub type BuiltInFn =
    fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()>;

/// Code bound to a function name.
#[derive(Clone)]
pub enum Code {
    /// A function implemented in Rust.
    BuiltIn(BuiltInFn),

    /// A function defined in a style file.
    Function(TokenList),

    /// A token executed in place of the function.
    ///
    /// Entry fields and entry-local variables are bound this way:
    ///     calling `title` executes a field token for `title`.
    Token(Token),

    /// A global integer variable.
    GlobalInteger(Rc<Cell<i64>>),

    /// A global string variable.
    GlobalString(Rc<RefCell<String>>),
}

impl Code {
    /// Runs the code.
    pub fn execute(
        &self,
        processor: &mut Processor,
        entry: Option<&Entry>,
        locator: Option<&Locator>,
    ) -> Result<()> {
        match self {
            Code::BuiltIn(f) => f(processor, entry, locator),
            Code::Function(list) => list.execute(processor, entry, locator),
            Code::Token(token) => token.execute(processor, entry, locator),
            Code::GlobalInteger(cell) => {
                let token = Token::new_integer(cell.get(), locator.cloned());
                processor.step(&token);
                processor.push(token);
                Ok(())
            }
            Code::GlobalString(cell) => {
                let token = Token::new_string(cell.borrow().as_str(), locator.cloned());
                processor.step(&token);
                processor.push(token);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::BuiltIn(_) => write!(f, "BuiltIn"),
            Code::Function(list) => write!(f, "Function({list})"),
            Code::Token(token) => write!(f, "Token({token})"),
            Code::GlobalInteger(cell) => write!(f, "GlobalInteger({})", cell.get()),
            Code::GlobalString(cell) => write!(f, "GlobalString({:?})", cell.borrow()),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::BuiltIn(_) => write![f, "a built-in function"],
            Code::Function(_) => write![f, "a user-defined function"],
            Code::Token(_) => write![f, "an entry variable"],
            Code::GlobalInteger(_) => write![f, "a global integer"],
            Code::GlobalString(_) => write![f, "a global string"],
        }
    }
}

/// A built-in function: code provided when the processor is created.
///
/// This struct is simply a combination of [Code] and a documentation string.
#[derive(Clone, Debug)]
pub struct BuiltIn {
    code: Code,
    doc: Option<&'static str>,
}

impl BuiltIn {
    pub fn new(f: BuiltInFn) -> BuiltIn {
        f.into()
    }

    // Set the doc for this built-in function.
    pub fn with_doc(mut self, doc: &'static str) -> BuiltIn {
        self.doc = Some(doc);
        self
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }
}

impl From<BuiltInFn> for BuiltIn {
    fn from(f: BuiltInFn) -> Self {
        Code::BuiltIn(f).into()
    }
}

impl From<Code> for BuiltIn {
    fn from(code: Code) -> Self {
        BuiltIn { code, doc: None }
    }
}

/// A function definition in the map.
#[derive(Clone, Debug)]
struct Definition {
    code: Code,
    locator: Option<Locator>,
}

/// Map from function names to code.
pub struct Map {
    functions: HashMap<Arc<str>, Definition>,
    built_ins: HashMap<Arc<str>, BuiltIn>,
}

impl Map {
    pub(crate) fn new(built_ins: HashMap<&str, BuiltIn>) -> Map {
        let built_ins: HashMap<Arc<str>, BuiltIn> = built_ins
            .into_iter()
            .map(|(name, built_in)| (Arc::from(name), built_in))
            .collect();
        let functions = built_ins
            .iter()
            .map(|(name, built_in)| {
                (
                    name.clone(),
                    Definition {
                        code: built_in.code.clone(),
                        locator: None,
                    },
                )
            })
            .collect();
        Map {
            functions,
            built_ins,
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Code> {
        self.functions.get(name).map(|definition| &definition.code)
    }

    /// Where the function was defined; [None] for built-ins.
    pub fn locator(&self, name: &str) -> Option<&Locator> {
        self.functions
            .get(name)
            .and_then(|definition| definition.locator.as_ref())
    }

    /// Binds the name to the code, replacing any earlier binding.
    pub fn insert<T: Into<Arc<str>>>(&mut self, name: T, code: Code, locator: Option<Locator>) {
        self.functions
            .insert(name.into(), Definition { code, locator });
    }

    /// The built-in functions the map was created with, including their documentation.
    ///
    /// Built-ins that have since been overridden are still returned.
    pub fn built_ins(&self) -> &HashMap<Arc<str>, BuiltIn> {
        &self.built_ins
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|name| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
