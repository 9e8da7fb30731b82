//! The ExBib virtual machine.
//!
//! The [Processor] owns everything a `.bst` program reads and writes while it runs:
//!
//! - The operand stack of [Tokens](Token).
//!
//! - The function table, which maps names to [Code].
//!     Literals call into this table.
//!
//! - The macro table, used when expanding literals and fields.
//!
//! - The string options read by string option tokens.
//!
//! - The [Database] of entries, used to resolve cross references.
//!
//! - The output sinks.
//!
//! The processor does not iterate over entries itself.
//! The caller binds an entry by passing it to [Processor::execute] or [Processor::call],
//!     once per entry being formatted.

use crate::code::{self, BuiltIn, Code};
use crate::entry::Database;
use crate::error::{self, Error};
use crate::prelude::*;
use crate::token::visitor::FunctionReferences;
use crate::token::{self, LocatorField};
use colored::Colorize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

mod config;

pub use config::{Config, DEFAULT_MAX_CALL_DEPTH};

/// The ExBib virtual machine.
pub struct Processor {
    /// Writer that receives the formatted bibliography.
    ///
    /// Defaults to standard out.
    pub output: Rc<RefCell<dyn Write>>,

    /// Writer that writes to the terminal.
    ///
    /// Defaults to standard error.
    pub terminal_out: Rc<RefCell<dyn Write>>,

    /// Writer that writes to the log file.
    ///
    /// Defaults to a sink writer that writes nothing.
    pub log_file: Rc<RefCell<dyn Write>>,

    stack: Vec<Token>,
    functions: code::Map,
    macros: HashMap<String, String>,
    options: HashMap<String, Token>,
    database: Database,
    config: Config,
    call_depth: usize,
    steps: u64,
    warnings: usize,
}

impl Processor {
    /// Creates a new processor with the default configuration.
    pub fn new(built_ins: HashMap<&str, BuiltIn>) -> Processor {
        Processor::with_config(built_ins, Default::default())
    }

    pub fn with_config(built_ins: HashMap<&str, BuiltIn>, config: Config) -> Processor {
        let options = config
            .options
            .iter()
            .map(|(name, value)| (name.clone(), Token::new_string(value.as_str(), None)))
            .collect();
        Processor {
            output: Rc::new(RefCell::new(std::io::stdout())),
            terminal_out: Rc::new(RefCell::new(std::io::stderr())),
            log_file: Rc::new(RefCell::new(std::io::sink())),
            stack: vec![],
            functions: code::Map::new(built_ins),
            macros: Default::default(),
            options,
            database: Default::default(),
            config,
            call_depth: 0,
            steps: 0,
            warnings: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.stack.push(token);
    }

    /// Pops the top of the stack, failing if the stack is empty.
    pub fn pop(&mut self) -> Result<Token> {
        self.stack
            .pop()
            .ok_or_else(|| Error::new(error::Kind::StackUnderflow, None))
    }

    /// Pops the top of the stack, returning [None] if the stack is empty.
    #[inline]
    pub fn pop_unchecked(&mut self) -> Option<Token> {
        self.stack.pop()
    }

    /// Pops an integer from the top of the stack.
    pub fn pop_integer(&mut self) -> Result<i64> {
        let token = self.pop()?;
        match token.int_value() {
            Some(i) => Ok(i),
            None => Err(Error::type_mismatch("an integer", &token, token.locator())),
        }
    }

    /// Pops a string from the top of the stack.
    ///
    /// Null strings and empty fields are returned as the empty string.
    pub fn pop_string(&mut self) -> Result<Arc<str>> {
        let popped = self.pop()?;
        match popped.kind() {
            token::Kind::String(Some(s)) => Ok(s.clone()),
            token::Kind::String(None) | token::Kind::EmptyField(_) => Ok(Arc::from("")),
            _ => Err(Error::type_mismatch("a string", &popped, popped.locator())),
        }
    }

    /// The stack, bottom first.
    pub fn stack(&self) -> &[Token] {
        &self.stack
    }

    /// Empties the stack, returning its former contents bottom first.
    pub fn take_stack(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.stack)
    }

    /// Binds a name to code, replacing any earlier binding.
    pub fn add_function<T: Into<Arc<str>>>(&mut self, name: T, code: Code, locator: Option<Locator>) {
        self.functions.insert(name, code, locator);
    }

    pub fn get_function(&self, name: &str) -> Option<&Code> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> &code::Map {
        &self.functions
    }

    /// Returns the names called by the program that are not bound to any code, in sorted order.
    ///
    /// This allows a style to be checked before it is run against any entry.
    pub fn undefined_functions(&self, program: &TokenList) -> Vec<Arc<str>> {
        FunctionReferences::of(program)
            .names()
            .filter(|name| self.functions.get(name).is_none())
            .map(Arc::from)
            .collect()
    }

    /// Declares a field of the database entries, e.g. `title`.
    pub fn add_entry_field(&mut self, name: &str, locator: Option<Locator>) {
        let name = name.to_lowercase();
        let token = Token::new_field(name.as_str(), locator.clone());
        self.add_function(name, Code::Token(token), locator);
    }

    /// Declares an integer variable that every entry has its own copy of.
    pub fn add_entry_integer(&mut self, name: &str, locator: Option<Locator>) {
        let token = Token::new_local_integer(name, locator.clone());
        self.add_function(name, Code::Token(token), locator);
    }

    /// Declares a string variable that every entry has its own copy of.
    pub fn add_entry_string(&mut self, name: &str, locator: Option<Locator>) {
        let token = Token::new_local_string(name, locator.clone());
        self.add_function(name, Code::Token(token), locator);
    }

    /// Declares a variable that reads a part of the current entry's locator.
    pub fn add_entry_locator(&mut self, name: &str, field: LocatorField, locator: Option<Locator>) {
        let token = Token::new_local_locator(name, field, locator.clone());
        self.add_function(name, Code::Token(token), locator);
    }

    /// Declares a global integer variable and returns a handle to its value.
    pub fn add_global_integer(
        &mut self,
        name: &str,
        initial_value: i64,
        locator: Option<Locator>,
    ) -> Rc<Cell<i64>> {
        let cell = Rc::new(Cell::new(initial_value));
        self.add_function(name, Code::GlobalInteger(cell.clone()), locator);
        cell
    }

    /// Declares a global string variable and returns a handle to its value.
    pub fn add_global_string(
        &mut self,
        name: &str,
        initial_value: &str,
        locator: Option<Locator>,
    ) -> Rc<RefCell<String>> {
        let cell = Rc::new(RefCell::new(initial_value.to_string()));
        self.add_function(name, Code::GlobalString(cell.clone()), locator);
        cell
    }

    pub fn get_macro(&self, name: &str) -> Option<&str> {
        self.macros.get(name).map(String::as_str)
    }

    /// Defines a macro, replacing any earlier definition.
    pub fn add_macro<N: Into<String>, T: Into<String>>(&mut self, name: N, text: T) {
        self.macros.insert(name.into(), text.into());
    }

    /// Returns the value of a string option, or the default if the option is not set.
    pub fn get_option(&self, name: &str, default: &Token) -> Token {
        self.options
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.clone())
    }

    pub fn set_option<T: Into<String>>(&mut self, name: T, value: Token) {
        self.options.insert(name.into(), value);
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.database
    }

    /// Records one execution step.
    ///
    /// When tracing is enabled the label is written to the log file.
    /// Errors writing the trace are ignored.
    pub fn step<T: fmt::Display + ?Sized>(&mut self, label: &T) {
        self.steps += 1;
        if self.config.trace {
            let prefix = format!["[{}]", self.steps];
            let _ = writeln!(self.log_file.borrow_mut(), "{} {}", prefix.dimmed(), label);
        }
    }

    /// The number of execution steps so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Writes a warning to the terminal and the log file.
    pub fn warn(&mut self, message: &str) -> Result<()> {
        self.warnings += 1;
        writeln!(
            self.terminal_out.borrow_mut(),
            "{}{}",
            "Warning--".yellow().bold(),
            message
        )?;
        writeln!(self.log_file.borrow_mut(), "Warning--{message}")?;
        Ok(())
    }

    /// The number of warnings issued so far.
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Appends text to the output.
    pub fn write_output(&mut self, text: &str) -> Result<()> {
        self.output.borrow_mut().write_all(text.as_bytes())?;
        Ok(())
    }

    /// Ends the current line of the output.
    pub fn newline_output(&mut self) -> Result<()> {
        self.write_output("\n")
    }

    /// Writes a line to the log file.
    pub fn write_log(&mut self, text: &str) -> Result<()> {
        writeln!(self.log_file.borrow_mut(), "{text}")?;
        Ok(())
    }

    /// Executes a program against an entry, or against no entry.
    pub fn execute(&mut self, program: &TokenList, entry: Option<&Entry>) -> Result<()> {
        program.execute(self, entry, None)
    }

    /// Calls the named function.
    ///
    /// This is how the commands `EXECUTE`, `ITERATE` and `REVERSE` of a style run functions.
    pub fn call(&mut self, name: &str, entry: Option<&Entry>) -> Result<()> {
        self.call_at(&Arc::from(name), entry, None)
    }

    /// Calls the named function on behalf of a token at the given location.
    pub fn call_at(
        &mut self,
        name: &Arc<str>,
        entry: Option<&Entry>,
        locator: Option<&Locator>,
    ) -> Result<()> {
        let code = match self.functions.get(name) {
            Some(code) => code.clone(),
            None => {
                return Err(Error::function_undefined(
                    name,
                    self.functions.names(),
                    locator,
                ))
            }
        };
        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::new(
                error::Kind::RecursionLimit {
                    limit: self.config.max_call_depth,
                },
                locator,
            ));
        }
        self.call_depth += 1;
        let result = code.execute(self, entry, locator);
        self.call_depth -= 1;
        result.map_err(|err| err.propagate(name, locator))
    }

    /// Runs a value popped from the stack as code.
    ///
    /// A block runs its contents and a literal calls its function.
    /// Other values are not callable.
    pub fn execute_callable(
        &mut self,
        callable: &Token,
        entry: Option<&Entry>,
        locator: Option<&Locator>,
    ) -> Result<()> {
        let locator = callable.locator().or(locator);
        match callable.kind() {
            token::Kind::Block(list) => list.execute(self, entry, locator),
            token::Kind::Literal(name) => self.call_at(name, entry, locator),
            _ => Err(Error::new(
                error::Kind::NotCallable {
                    found: callable.to_string(),
                },
                locator,
            )),
        }
    }

    /// Assigns a value to the variable bound to the name.
    ///
    /// Global variables and the current entry's integer and string variables can be assigned.
    pub fn assign(&mut self, name: &str, value: Token, entry: Option<&Entry>) -> Result<()> {
        let locator = value.locator().cloned();
        let locator = locator.as_ref();
        let code = match self.functions.get(name) {
            Some(code) => code.clone(),
            None => {
                return Err(Error::function_undefined(
                    name,
                    self.functions.names(),
                    locator,
                ))
            }
        };
        match &code {
            Code::GlobalInteger(cell) => cell.set(integer_value(&value)?),
            Code::GlobalString(cell) => *cell.borrow_mut() = string_value(&value)?.to_string(),
            Code::Token(bound) => match bound.kind() {
                token::Kind::LocalInteger(local) => {
                    let i = integer_value(&value)?;
                    require_entry(entry, locator)?.set_local_integer(local, i);
                }
                token::Kind::LocalString(local) => {
                    let s = string_value(&value)?;
                    require_entry(entry, locator)?.set_local_string(local, s);
                }
                _ => return Err(not_assignable(name, &code, locator)),
            },
            Code::BuiltIn(_) | Code::Function(_) => {
                return Err(not_assignable(name, &code, locator))
            }
        }
        Ok(())
    }
}

fn integer_value(token: &Token) -> Result<i64> {
    token
        .int_value()
        .ok_or_else(|| Error::type_mismatch("an integer", token, token.locator()))
}

fn string_value(token: &Token) -> Result<&str> {
    token
        .string_value()
        .ok_or_else(|| Error::type_mismatch("a string", token, token.locator()))
}

fn require_entry<'a>(entry: Option<&'a Entry>, locator: Option<&Locator>) -> Result<&'a Entry> {
    entry.ok_or_else(|| Error::new(error::Kind::MissingEntry, locator))
}

fn not_assignable(name: &str, code: &Code, locator: Option<&Locator>) -> Box<Error> {
    Error::new(
        error::Kind::NotAssignable {
            name: name.to_string(),
            code: code.to_string(),
        },
        locator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::BuiltInFn;
    use crate::token::T_ONE;

    fn write(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
        let token = processor.pop()?;
        let text = token.expand(processor)?;
        processor.write_output(&text)
    }

    fn newline(processor: &mut Processor, _: Option<&Entry>, _: Option<&Locator>) -> Result<()> {
        processor.newline_output()
    }

    fn literal(name: &str) -> Token {
        Token::new_literal(name, Some(Locator::new("test.bst", 1))).unwrap()
    }

    fn new_processor() -> (Processor, Rc<RefCell<Vec<u8>>>) {
        let mut built_ins = HashMap::new();
        built_ins.insert("write$", BuiltIn::new(write as BuiltInFn));
        built_ins.insert("newline$", BuiltIn::new(newline as BuiltInFn));
        let mut processor = Processor::new(built_ins);
        let output = Rc::new(RefCell::new(Vec::<u8>::new()));
        processor.output = output.clone();
        (processor, output)
    }

    #[test]
    fn write_result_of_user_function() {
        let (mut processor, output) = new_processor();
        processor.add_function(
            "abc",
            Code::Function(TokenList::new(vec![Token::new_integer(1, None)])),
            None,
        );
        let entry = Entry::new("book", "bible", None).with_field("title", "The Bible");
        let program = TokenList::new(vec![literal("abc"), literal("write$"), literal("newline$")]);
        processor.execute(&program, Some(&entry)).unwrap();
        assert_eq!(output.borrow().as_slice(), b"1\n");
        assert!(processor.stack().is_empty());
    }

    #[test]
    fn pop_on_empty_stack() {
        let (mut processor, _) = new_processor();
        assert!(processor.pop_unchecked().is_none());
        let err = processor.pop().unwrap_err();
        assert!(matches!(err.kind(), error::Kind::StackUnderflow));
    }

    #[test]
    fn typed_pops() {
        let (mut processor, _) = new_processor();
        processor.push(Token::new_string("a", None));
        let err = processor.pop_integer().unwrap_err();
        assert!(matches!(
            err.kind(),
            error::Kind::TypeMismatch {
                expected: "an integer",
                ..
            }
        ));
        processor.push(Token::new_integer(3, None));
        let err = processor.pop_string().unwrap_err();
        assert!(matches!(err.kind(), error::Kind::TypeMismatch { .. }));
        processor.push(Token::new_null_string(None));
        processor.push(Token::new_empty_field("title", None));
        assert_eq!(processor.pop_string().unwrap().as_ref(), "");
        assert_eq!(processor.pop_string().unwrap().as_ref(), "");
    }

    #[test]
    fn user_function_overrides_built_in() {
        let (mut processor, output) = new_processor();
        processor.add_function(
            "write$",
            Code::Function(TokenList::new(vec![literal("newline$")])),
            None,
        );
        processor.call("write$", None).unwrap();
        assert_eq!(output.borrow().as_slice(), b"\n");
    }

    #[test]
    fn errors_record_the_call_stack() {
        let (mut processor, _) = new_processor();
        processor.add_function("inner", Code::Function(TokenList::new(vec![literal("pop$")])), None);
        processor.add_function("outer", Code::Function(TokenList::new(vec![literal("inner")])), None);
        let err = processor.call("outer", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::FunctionUndefined { .. }));
        let functions: Vec<&str> = err
            .stack_trace()
            .iter()
            .map(|element| element.function.as_ref())
            .collect();
        assert_eq!(functions, vec!["inner", "outer"]);
    }

    #[test]
    fn unbounded_recursion_is_an_error() {
        let config = Config {
            max_call_depth: 20,
            ..Default::default()
        };
        let mut processor = Processor::with_config(Default::default(), config);
        processor.add_function("loop", Code::Function(TokenList::new(vec![literal("loop")])), None);
        let err = processor.call("loop", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::RecursionLimit { limit: 20 }));
        assert_eq!(err.stack_trace().len(), 20);
    }

    #[test]
    fn unbounded_recursion_at_default_depth_is_an_error() {
        let mut processor = Processor::new(Default::default());
        processor.add_function("loop", Code::Function(TokenList::new(vec![literal("loop")])), None);
        let err = processor.call("loop", None).unwrap_err();
        assert!(matches!(
            err.kind(),
            error::Kind::RecursionLimit {
                limit: DEFAULT_MAX_CALL_DEPTH
            }
        ));
        assert_eq!(err.stack_trace().len(), DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(processor.call_depth, 0);
    }

    #[test]
    fn execute_callable_rejects_strings() {
        let (mut processor, _) = new_processor();
        let err = processor
            .execute_callable(&Token::new_string("x", None), None, None)
            .unwrap_err();
        assert!(matches!(err.kind(), error::Kind::NotCallable { .. }));
    }

    #[test]
    fn assign_globals() {
        let (mut processor, _) = new_processor();
        let integer = processor.add_global_integer("count", 0, None);
        let string = processor.add_global_string("label", "", None);
        processor
            .assign("count", Token::new_integer(7, None), None)
            .unwrap();
        processor
            .assign("label", Token::new_string("x", None), None)
            .unwrap();
        assert_eq!(integer.get(), 7);
        assert_eq!(string.borrow().as_str(), "x");
        let err = processor
            .assign("count", Token::new_string("x", None), None)
            .unwrap_err();
        assert!(matches!(err.kind(), error::Kind::TypeMismatch { .. }));
    }

    #[test]
    fn assign_entry_variables() {
        let (mut processor, _) = new_processor();
        processor.add_entry_integer("n", None);
        processor.add_entry_string("s", None);
        let entry = Entry::new("book", "bible", None);
        processor
            .assign("n", Token::new_integer(2, None), Some(&entry))
            .unwrap();
        processor
            .assign("s", Token::new_string("x", None), Some(&entry))
            .unwrap();
        processor.call("n", Some(&entry)).unwrap();
        processor.call("s", Some(&entry)).unwrap();
        assert_eq!(processor.pop_string().unwrap().as_ref(), "x");
        assert_eq!(processor.pop_integer().unwrap(), 2);
        let err = processor
            .assign("n", Token::new_integer(2, None), None)
            .unwrap_err();
        assert!(matches!(err.kind(), error::Kind::MissingEntry));
    }

    #[test]
    fn assign_to_function_fails() {
        let (mut processor, _) = new_processor();
        processor.add_entry_field("title", None);
        for name in ["write$", "title"] {
            let err = processor
                .assign(name, Token::new_string("x", None), None)
                .unwrap_err();
            assert!(
                matches!(err.kind(), error::Kind::NotAssignable { .. }),
                "{name}: {err:?}"
            );
        }
    }

    #[test]
    fn entry_locators_are_callable() {
        let (mut processor, _) = new_processor();
        processor.add_entry_locator("bib.file", LocatorField::Resource, None);
        processor.add_entry_locator("bib.line", LocatorField::Line, None);
        let entry = Entry::new("book", "bible", Some(Locator::new("refs.bib", 7)));
        processor.call("bib.file", Some(&entry)).unwrap();
        processor.call("bib.line", Some(&entry)).unwrap();
        assert_eq!(processor.pop_string().unwrap().as_ref(), "7");
        assert_eq!(processor.pop_string().unwrap().as_ref(), "refs.bib");
        let err = processor.call("bib.file", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::MissingEntry));
    }

    #[test]
    fn entry_fields_are_callable() {
        let (mut processor, _) = new_processor();
        processor.add_entry_field("Title", None);
        let entry = Entry::new("book", "bible", None).with_field("title", "The Bible");
        processor.call("title", Some(&entry)).unwrap();
        assert_eq!(processor.pop_string().unwrap().as_ref(), "The Bible");
    }

    #[test]
    fn undefined_functions() {
        let (processor, _) = new_processor();
        let program = TokenList::new(vec![
            literal("write$"),
            Token::new_block(TokenList::new(vec![literal("zzz")]), None),
            Token::new_qliteral("aaa", None).unwrap(),
        ]);
        let undefined: Vec<String> = processor
            .undefined_functions(&program)
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(undefined, vec!["aaa", "zzz"]);
    }

    #[test]
    fn options_from_config() {
        let mut config = Config::default();
        config.options.insert("lang".into(), "de".into());
        let processor = Processor::with_config(Default::default(), config);
        assert_eq!(
            processor.get_option("lang", T_ONE.get()),
            Token::new_string("de", None)
        );
        assert_eq!(processor.get_option("other", T_ONE.get()), *T_ONE.get());
    }

    #[test]
    fn trace_writes_to_log_file() {
        let config = Config {
            trace: true,
            ..Default::default()
        };
        let mut processor = Processor::with_config(Default::default(), config);
        let log = Rc::new(RefCell::new(Vec::<u8>::new()));
        processor.log_file = log.clone();
        colored::control::set_override(false);
        Token::new_integer(5, None)
            .execute(&mut processor, None, None)
            .unwrap();
        Token::new_string("x", None)
            .execute(&mut processor, None, None)
            .unwrap();
        assert_eq!(processor.steps(), 2);
        let log = String::from_utf8(log.borrow().clone()).unwrap();
        assert_eq!(log, "[1] #5\n[2] \"x\"\n");
    }

    struct BrokenLog;

    impl Write for BrokenLog {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "log is closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn trace_write_errors_are_ignored() {
        let config = Config {
            trace: true,
            ..Default::default()
        };
        let mut processor = Processor::with_config(Default::default(), config);
        processor.log_file = Rc::new(RefCell::new(BrokenLog));
        Token::new_integer(5, None)
            .execute(&mut processor, None, None)
            .unwrap();
        assert_eq!(processor.steps(), 1);
        assert_eq!(processor.pop_integer().unwrap(), 5);
    }

    #[test]
    fn warnings_are_counted() {
        let (mut processor, _) = new_processor();
        processor.terminal_out = Rc::new(RefCell::new(std::io::sink()));
        let log = Rc::new(RefCell::new(Vec::<u8>::new()));
        processor.log_file = log.clone();
        processor.warn("empty author in bible").unwrap();
        assert_eq!(processor.warnings(), 1);
        assert_eq!(log.borrow().as_slice(), b"Warning--empty author in bible\n");
    }
}
