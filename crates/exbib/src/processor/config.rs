use std::collections::BTreeMap;

/// Default value of [Config::max_call_depth].
///
/// This many nested calls, including calls made through `if$` and `while$`,
///     fit in the 2 MiB stack of a spawned thread.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Configuration of a [Processor](super::Processor).
///
/// With the `serde` feature enabled every field is optional when deserializing;
///     missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Write a line to the log file for every value pushed onto the stack.
    pub trace: bool,

    /// Maximum nesting of function calls before execution fails.
    pub max_call_depth: usize,

    /// Initial values of the string options read by string option tokens.
    pub options: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trace: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            options: Default::default(),
        }
    }
}
