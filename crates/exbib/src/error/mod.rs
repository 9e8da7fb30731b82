//! Error handling
//!
//! Every error in ExBib is fatal to the execution that raised it:
//!     errors propagate out of [execute](crate::token::Token::execute) and
//!     [expand](crate::token::Token::expand) unchanged,
//!     except that each user-function call the error passes through is recorded in the error's stack trace.
//! Whether to skip the current entry or to abort the whole run is decided by the caller.

use crate::token::Locator;
use std::fmt;
use std::sync::Arc;

mod display;

/// An error raised while running a `.bst` program.
#[derive(Debug)]
pub struct Error {
    kind: Kind,
    locator: Option<Locator>,
    stack_trace: Vec<StackTraceElement>,
}

/// The type of an error.
#[derive(Debug)]
pub enum Kind {
    /// A literal or quoted literal was created with an empty name.
    EmptyFunctionName,
    /// A token that reads the current entry was executed with no entry bound.
    MissingEntry,
    /// A literal was executed but no function is bound to its name.
    FunctionUndefined {
        name: String,
        /// Defined functions that are spelled similarly, closest first.
        close_names: Vec<String>,
    },
    /// An absent field was expanded.
    UndefinedField { name: String },
    /// Integer text contained something other than an optionally signed decimal number.
    IllegalValue { text: String },
    /// Integer text contained no digits.
    NoNumber { text: String },
    /// A value was popped from an empty operand stack.
    StackUnderflow,
    /// A value popped from the operand stack had the wrong type.
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// A list of names contained a token that is not a literal.
    MissingLiteral { found: String },
    /// An assignment targeted a function that is not a variable.
    NotAssignable { name: String, code: String },
    /// A value that is neither a block nor a function literal was used as code.
    NotCallable { found: String },
    /// A built-in function received an argument it cannot handle.
    InvalidArgument {
        function: &'static str,
        message: String,
    },
    /// Function calls were nested deeper than the configured limit.
    RecursionLimit { limit: usize },
    /// Writing to an output failed.
    Io(std::io::Error),
}

impl Kind {
    /// A one line description of the error.
    pub fn title(&self) -> String {
        match self {
            Kind::EmptyFunctionName => "function name is empty".into(),
            Kind::MissingEntry => "no entry is available in this context".into(),
            Kind::FunctionUndefined { name, .. } => format!["undefined function `{name}`"],
            Kind::UndefinedField { name } => format!["field `{name}` is undefined"],
            Kind::IllegalValue { text } => format!["illegal integer value `{text}`"],
            Kind::NoNumber { text } => format!["no number found in `{text}`"],
            Kind::StackUnderflow => "the stack is empty".into(),
            Kind::TypeMismatch { expected, .. } => {
                format!["expected {expected} on top of the stack"]
            }
            Kind::MissingLiteral { found } => format!["expected a literal, found `{found}`"],
            Kind::NotAssignable { name, .. } => format!["`{name}` cannot be assigned to"],
            Kind::NotCallable { found } => format!["`{found}` is not a block or function"],
            Kind::InvalidArgument { function, message } => format!["{function}: {message}"],
            Kind::RecursionLimit { limit } => {
                format!["function calls nested more than {limit} levels deep"]
            }
            Kind::Io(err) => format!["failed to write output: {err}"],
        }
    }

    /// Additional lines shown beneath the title.
    pub fn notes(&self) -> Vec<String> {
        match self {
            Kind::FunctionUndefined { close_names, .. } => close_names
                .first()
                .map(|close_name| vec![format!["did you mean `{close_name}`?"]])
                .unwrap_or_default(),
            Kind::TypeMismatch { found, .. } => vec![format!["found `{found}` instead"]],
            Kind::NotAssignable { code, .. } => {
                vec![format!["it is bound to {code}; only entry and global variables can be assigned"]]
            }
            Kind::MissingEntry => {
                vec!["entry fields and variables can only be read while an entry is being processed".into()]
            }
            Kind::RecursionLimit { .. } => {
                vec!["the limit is set by the `max_call_depth` configuration value".into()]
            }
            _ => vec![],
        }
    }
}

/// A user-function call that an error propagated through.
#[derive(Debug, Clone)]
pub struct StackTraceElement {
    pub function: Arc<str>,
    pub locator: Option<Locator>,
}

impl Error {
    pub fn new(kind: Kind, locator: Option<&Locator>) -> Box<Error> {
        Box::new(Error {
            kind,
            locator: locator.cloned(),
            stack_trace: vec![],
        })
    }

    /// Creates an invalid argument error for a built-in function.
    pub fn invalid_argument<T: Into<String>>(
        function: &'static str,
        message: T,
        locator: Option<&Locator>,
    ) -> Box<Error> {
        Error::new(
            Kind::InvalidArgument {
                function,
                message: message.into(),
            },
            locator,
        )
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch<T: fmt::Display>(
        expected: &'static str,
        found: &T,
        locator: Option<&Locator>,
    ) -> Box<Error> {
        Error::new(
            Kind::TypeMismatch {
                expected,
                found: found.to_string(),
            },
            locator,
        )
    }

    /// Creates an undefined function error, suggesting defined names that are spelled similarly.
    pub fn function_undefined<'a, I: IntoIterator<Item = &'a str>>(
        name: &str,
        defined: I,
        locator: Option<&Locator>,
    ) -> Box<Error> {
        Error::new(
            Kind::FunctionUndefined {
                name: name.to_string(),
                close_names: find_close_names(defined, name),
            },
            locator,
        )
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Where the error occurred, if known.
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// The user-function calls the error propagated through, innermost first.
    pub fn stack_trace(&self) -> &[StackTraceElement] {
        &self.stack_trace
    }

    /// Records that the error propagated out of a call to the named function.
    pub(crate) fn propagate(
        mut self: Box<Self>,
        function: &Arc<str>,
        locator: Option<&Locator>,
    ) -> Box<Self> {
        if self.locator.is_none() {
            self.locator = locator.cloned();
        }
        self.stack_trace.push(StackTraceElement {
            function: function.clone(),
            locator: locator.cloned(),
        });
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display::format_error(f, self)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            Kind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Box<Error> {
    fn from(err: std::io::Error) -> Self {
        Error::new(Kind::Io(err), None)
    }
}

/// Maximum number of suggestions attached to an undefined function error.
const MAX_CLOSE_NAMES: usize = 3;

/// Returns the names within a small edit distance of the word, closest first.
fn find_close_names<'a, I: IntoIterator<Item = &'a str>>(dictionary: I, word: &str) -> Vec<String> {
    let max_distance = std::cmp::max(1, word.chars().count() / 3);
    let mut candidates: Vec<(usize, &str)> = dictionary
        .into_iter()
        .map(|candidate| (levenshtein_distance(word, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .take(MAX_CLOSE_NAMES)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

// Only the distance is needed here, so two rows of the matrix suffice.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_i) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            let cost_modify = previous[j] + usize::from(a_i != *b_j);
            let cost_subtract = previous[j + 1] + 1;
            let cost_add = current[j] + 1;
            current[j + 1] = cost_modify.min(cost_subtract).min(cost_add);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
