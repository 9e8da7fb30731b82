/*!
ExBib unit testing library

This is a crate for writing unit tests for built-in functions of the ExBib processor.
It is used extensively in the ExBib standard library,
    so the unit tests there are good examples of what this crate can do.

## Test programs

Test programs are written in a small notation for token sequences,
    read by [`read_program`].
Tokens are separated by whitespace:

- `{` and `}` delimit a block.
- `"..."` is a string; it may contain spaces but not double quotes.
- `#n` is an integer, e.g. `#-3`.
- `'name` is a quoted literal.
- Anything else is a literal, i.e. a function call.

For example `#1 { "yes" } { "no" } if$ write$` writes `yes`.

## Test types

### Output tests

Run using [`run_output_test`].
These tests verify that a program writes exactly the expected text to the output.

### Stack tests

Run using [`run_stack_test`].
These tests verify that two programs leave the same values on the stack.
Usually the second program is just a list of constants.

### Failure tests

Run using [`run_failure_test`].
These tests verify that a program fails.

### Serde tests

Run using [`run_serde_test`].
These tests verify that a program survives serialization and deserialization:
    the deserialized program is equal to the original,
    and running it writes the same output and leaves the same stack.
Without the `serde` feature these tests are ignored.

## The test suite macro

The preferred way to write a suite of unit tests is the [`test_suite`] macro.
See the macro's documentation for instructions on using it.
*/

use exbib::code::BuiltIn;
use exbib::error::{self, Error};
use exbib::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Name of the resource that test programs are read from.
pub const RESOURCE: &str = "testing.bst";

/// Reads a test program.
pub fn read_program(source: &str) -> Result<TokenList> {
    let mut reader = Reader {
        chars: source.chars().peekable(),
        line: 1,
    };
    let (list, closed) = reader.read_list()?;
    if closed {
        return Err(Error::invalid_argument(
            "read_program",
            "unbalanced `}`",
            Some(&reader.locator()),
        ));
    }
    Ok(list)
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
}

impl<'a> Reader<'a> {
    fn locator(&self) -> Locator {
        Locator::new(RESOURCE, self.line)
    }

    /// Reads tokens until the end of input or a closing brace.
    ///
    /// The boolean is true if the list was ended by a closing brace.
    fn read_list(&mut self) -> Result<(TokenList, bool)> {
        let mut tokens = vec![];
        loop {
            self.skip_whitespace();
            let locator = self.locator();
            let token = match self.chars.next() {
                None => return Ok((tokens.into(), false)),
                Some('}') => return Ok((tokens.into(), true)),
                Some('{') => {
                    let (list, closed) = self.read_list()?;
                    if !closed {
                        return Err(Error::invalid_argument(
                            "read_program",
                            "unbalanced `{`",
                            Some(&locator),
                        ));
                    }
                    Token::new_block(list, Some(locator))
                }
                Some('"') => {
                    let mut value = String::new();
                    loop {
                        match self.chars.next() {
                            None => {
                                return Err(Error::invalid_argument(
                                    "read_program",
                                    "unterminated string",
                                    Some(&locator),
                                ))
                            }
                            Some('"') => break,
                            Some(c) => {
                                if c == '\n' {
                                    self.line += 1;
                                }
                                value.push(c)
                            }
                        }
                    }
                    Token::new_string(value, Some(locator))
                }
                Some('#') => {
                    let word = self.read_word();
                    Token::parse_integer(&format!["#{word}"], Some(locator))?
                }
                Some('\'') => Token::new_qliteral(self.read_word(), Some(locator))?,
                Some(c) => {
                    let mut word = c.to_string();
                    word.push_str(&self.read_word());
                    Token::new_literal(word, Some(locator))?
                }
            };
            tokens.push(token);
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.chars.next();
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }
}

/// Option passed to a test runner.
pub enum TestOption<'a> {
    /// The built-in functions are the result of invoking the provided static function.
    ///
    /// Overrides previous `BuiltInFunctions` or `BuiltInFunctionsDyn` options.
    BuiltInFunctions(fn() -> HashMap<&'static str, BuiltIn>),

    /// The built-in functions are the result of invoking the provided closure.
    ///
    /// Overrides previous `BuiltInFunctions` or `BuiltInFunctionsDyn` options.
    BuiltInFunctionsDyn(Box<dyn Fn() -> HashMap<&'static str, BuiltIn> + 'a>),

    /// The provided static function is invoked after the processor is created and before execution starts.
    ///
    /// Overrides previous `CustomProcessorInitialization` options.
    CustomProcessorInitialization(fn(&mut Processor)),

    /// The entry that the programs are run against.
    ///
    /// The entry is added to the processor's database before execution starts.
    /// Without this option programs are run against no entry.
    Entry(fn() -> Entry),
}

struct ResolvedOptions<'a> {
    built_in_functions: &'a dyn Fn() -> HashMap<&'static str, BuiltIn>,
    custom_processor_initialization: fn(&mut Processor),
    entry: Option<fn() -> Entry>,
}

impl<'a> ResolvedOptions<'a> {
    fn new(options: &'a [TestOption]) -> Self {
        let mut resolved = Self {
            built_in_functions: &HashMap::new,
            custom_processor_initialization: |_| {},
            entry: None,
        };
        for option in options {
            match option {
                TestOption::BuiltInFunctions(f) => resolved.built_in_functions = f,
                TestOption::BuiltInFunctionsDyn(f) => resolved.built_in_functions = f,
                TestOption::CustomProcessorInitialization(f) => {
                    resolved.custom_processor_initialization = *f
                }
                TestOption::Entry(f) => resolved.entry = Some(*f),
            }
        }
        resolved
    }
}

/// The result of running a test program.
struct Run {
    processor: Processor,
    output: Rc<RefCell<Vec<u8>>>,
    result: Result<()>,
}

impl Run {
    fn output(&self) -> String {
        String::from_utf8_lossy(&self.output.borrow()).into_owned()
    }
}

fn run(source: &str, options: &ResolvedOptions) -> Run {
    run_program(read_program(source), options)
}

fn run_program(program: Result<TokenList>, options: &ResolvedOptions) -> Run {
    let mut processor = Processor::new((options.built_in_functions)());
    let output = Rc::new(RefCell::new(Vec::<u8>::new()));
    processor.output = output.clone();
    processor.terminal_out = Rc::new(RefCell::new(std::io::sink()));
    (options.custom_processor_initialization)(&mut processor);
    let entry = options
        .entry
        .map(|f| processor.database_mut().insert(f()));
    let result = program.and_then(|program| processor.execute(&program, entry.as_deref()));
    Run {
        processor,
        output,
        result,
    }
}

fn unwrap_or_panic(run: &Run, source: &str) {
    if let Err(err) = &run.result {
        println!("{err}");
        panic!("Execution of `{source}` failed");
    }
}

/// Run an output test.
///
/// The test passes if the program runs successfully and writes exactly the expected text to the output.
pub fn run_output_test(source: &str, expected: &str, options: &[TestOption]) {
    let options = ResolvedOptions::new(options);
    let run = run(source, &options);
    unwrap_or_panic(&run, source);
    let output = run.output();
    if output != expected {
        println!("Output is different:");
        println!("------[actual]------");
        println!("'{output}'");
        println!("-----[expected]-----");
        println!("'{expected}'");
        println!("--------------------");
        panic!("Output test failed");
    }
}

/// Run a stack test.
///
/// The test passes if both programs run successfully and leave equal values on the stack.
pub fn run_stack_test(lhs: &str, rhs: &str, options: &[TestOption]) {
    let options = ResolvedOptions::new(options);
    let run_1 = run(lhs, &options);
    unwrap_or_panic(&run_1, lhs);
    let run_2 = run(rhs, &options);
    unwrap_or_panic(&run_2, rhs);
    let stack_1 = run_1.processor.stack();
    let stack_2 = run_2.processor.stack();
    if stack_1 != stack_2 {
        println!("Stacks are different:");
        println!("------[lhs]------");
        println!("{}", TokenList::from_iter(stack_1.iter().cloned()));
        println!("------[rhs]------");
        println!("{}", TokenList::from_iter(stack_2.iter().cloned()));
        println!("-----------------");
        panic!("Stack test failed");
    }
}

/// Run a failure test.
///
/// The test passes if execution of the program fails.
pub fn run_failure_test(source: &str, options: &[TestOption]) {
    let options = ResolvedOptions::new(options);
    let run = run(source, &options);
    match &run.result {
        Ok(()) => {
            println!("Execution succeeded:");
            println!("{}", TokenList::from_iter(run.processor.stack().iter().cloned()));
            panic!("Failure test did not pass: execution successful");
        }
        Err(err) => {
            if let error::Kind::InvalidArgument {
                function: "read_program",
                ..
            } = err.kind()
            {
                panic!("Failure test did not pass: the program could not be read: {err}");
            }
        }
    }
}

#[cfg(not(feature = "serde"))]
/// Run a serialization/deserialization test
pub fn run_serde_test(_source: &str, _options: &[TestOption]) {}

#[cfg(feature = "serde")]
/// Run a serialization/deserialization test
///
/// The program is serialized to JSON and deserialized again.
/// The test passes if the two programs are equal,
///     and running them writes the same output and leaves equal values on the stack.
pub fn run_serde_test(source: &str, options: &[TestOption]) {
    let options = ResolvedOptions::new(options);
    let program = match read_program(source) {
        Ok(program) => program,
        Err(err) => {
            println!("{err}");
            panic!("Failed to read `{source}`");
        }
    };
    let serialized = serde_json::to_string_pretty(&program).unwrap();
    println!("Serialized program: {serialized}");
    let deserialized: TokenList = serde_json::from_str(&serialized).unwrap();
    assert_eq!(program.to_string(), deserialized.to_string());
    assert_eq!(program, deserialized);

    let run_1 = run_program(Ok(program), &options);
    unwrap_or_panic(&run_1, source);
    let run_2 = run_program(Ok(deserialized), &options);
    unwrap_or_panic(&run_2, source);
    assert_eq!(run_1.output(), run_2.output());
    if run_1.processor.stack() != run_2.processor.stack() {
        println!("Stacks are different:");
        println!("------[original]------");
        println!("{}", TokenList::from_iter(run_1.processor.stack().iter().cloned()));
        println!("----[deserialized]----");
        println!("{}", TokenList::from_iter(run_2.processor.stack().iter().cloned()));
        println!("----------------------");
        panic!("Serde test failed");
    }
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macros looks like this:
/// ```
/// # use exbib_testing::*;
/// # use std::collections::HashMap;
/// # use exbib::code::BuiltIn;
/// # fn built_in_functions() -> HashMap<&'static str, BuiltIn> { HashMap::new() }
/// test_suite![
///     options(TestOption::BuiltInFunctions(built_in_functions)),
///     output_tests(
///         (case_1, r#""a""#, ""),
///     ),
///     stack_tests(
///         (case_2, "#1 #2", "#1 #2"),
///     ),
///     failure_tests(
///         (case_3, "undefined$"),
///     ),
///     serde_tests(
///         (case_4, "#1 { #2 }"),
///     ),
/// ];
/// ```
///
/// The arguments to the macro are:
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runner.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case they default to `options(TestOption::BuiltInFunctions(built_in_functions))`.
///     In this case `built_in_functions` is a static function in the current scope that returns
///     the built-in functions to initialize the processor with.
///
/// - `output_tests(cases...)`: each case is of the form (case name, program, expected output).
///     The data here is fed into the [run_output_test] test runner.
///
/// - `stack_tests(cases...)`: each case is of the form (case name, program, expected stack program).
///     The data here is fed into the [run_stack_test] test runner.
///
/// - `failure_tests(cases...)`: each case is of the form (case name, program).
///     The data here is fed into the [run_failure_test] test runner.
///
/// - `serde_tests(cases...)`: each case is of the form (case name, program).
///     The data here is fed into the [run_serde_test] test runner.
///     The generated tests are ignored unless the `serde` feature of the calling crate is enabled.
///
/// Only one `options()` argument may be provided, and if provided it must be in the first position.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( options $options: tt, output_tests ( $( ($name: ident, $input: expr, $expected: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let expected = $expected;
                let options = vec! $options;
                $crate::run_output_test(&input, &expected, &options);
            }
        )*
    );
    ( options $options: tt, stack_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let lhs = $lhs;
                let rhs = $rhs;
                let options = vec! $options;
                $crate::run_stack_test(&lhs, &rhs, &options);
            }
        )*
    );
    ( options $options: tt, failure_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                $crate::run_failure_test(&input, &options);
            }
        )*
    );
    ( options $options: tt, serde_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[cfg_attr(not(feature = "serde"), ignore)]
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                $crate::run_serde_test(&input, &options);
            }
        )*
    );
    ( options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `options`, `output_tests`, `stack_tests`, `failure_tests`, `serde_tests`");
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            $crate::test_suite![options $options, $test_kind $test_cases,];
        )+
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![options ($crate::TestOption::BuiltInFunctions(built_in_functions)), $( $test_kind $test_cases, )+ ];
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib::token;

    #[test]
    fn read_program_kinds() {
        let program = read_program("#-3 \"a b\" 'f g$ { #1 { } }").unwrap();
        let kinds: Vec<&str> = program
            .iter()
            .map(|token| match token.kind() {
                token::Kind::Integer(_) => "integer",
                token::Kind::String(_) => "string",
                token::Kind::QLiteral(_) => "qliteral",
                token::Kind::Literal(_) => "literal",
                token::Kind::Block(_) => "block",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["integer", "string", "qliteral", "literal", "block"]
        );
        assert_eq!(program.to_string(), "#-3 \"a b\" 'f g$ {#1 {}}");
    }

    #[test]
    fn read_program_tracks_lines() {
        let program = read_program("a\n\nb").unwrap();
        let lines: Vec<u32> = program
            .iter()
            .filter_map(|token| token.locator().map(Locator::line))
            .collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn read_program_errors() {
        for source in ["{ a", "a }", "\"abc", "#x", "'"] {
            assert!(read_program(source).is_err(), "{source}");
        }
    }

    test_suite![
        options(TestOption::BuiltInFunctions(HashMap::new)),
        stack_tests((constants, "#1 \"a\" { b }", "#1 \"a\" {b}"),),
        failure_tests((undefined_function, "undefined$"),),
        serde_tests((serde_constants, r#"#-3 "a b" { 'f { #1 } }"#),),
    ];

    #[test]
    fn output_of_empty_program() {
        run_output_test("", "", &[]);
    }
}
