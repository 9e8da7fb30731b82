//! # The ExBib standard library
//!
//! This crate contains implementations of the built-in functions of the BibTeX style language.
//! Each module groups related functions;
//!     [built_in_functions] returns all of them, keyed by the names style files use.

use exbib::code::BuiltIn;
use exbib::prelude::*;
use std::collections::HashMap;

pub mod assign;
pub mod case;
pub mod control;
pub mod conversion;
pub mod entry;
pub mod io;
pub mod math;
pub mod names;
pub mod stack;
pub mod strings;
pub mod text;

/// Value of `global.max$`, the maximum length of global strings in BibTeX.
pub const GLOBAL_MAX: i64 = 20000;

/// Value of `entry.max$`, the maximum length of entry strings in BibTeX.
pub const ENTRY_MAX: i64 = 250;

/// Returns all of the built-in functions of the standard library.
pub fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
    HashMap::from([
        ("+", math::get_plus()),
        ("-", math::get_minus()),
        ("*", strings::get_concatenate()),
        ("<", math::get_less_than()),
        (">", math::get_greater_than()),
        ("=", math::get_equals()),
        (":=", assign::get_assign()),
        ("add.period$", strings::get_add_period()),
        ("call.type$", control::get_call_type()),
        ("change.case$", case::get_change_case()),
        ("chr.to.int$", conversion::get_chr_to_int()),
        ("cite$", entry::get_cite()),
        ("duplicate$", stack::get_duplicate()),
        ("empty$", entry::get_empty()),
        ("format.name$", names::get_format_name()),
        ("if$", control::get_if()),
        ("int.to.chr$", conversion::get_int_to_chr()),
        ("int.to.str$", conversion::get_int_to_str()),
        ("missing$", entry::get_missing()),
        ("newline$", io::get_newline()),
        ("num.names$", names::get_num_names()),
        ("pop$", stack::get_pop()),
        ("preamble$", entry::get_preamble()),
        ("purify$", text::get_purify()),
        ("quote$", strings::get_quote()),
        ("skip$", stack::get_skip()),
        ("stack$", stack::get_stack()),
        ("substring$", strings::get_substring()),
        ("swap$", stack::get_swap()),
        ("text.length$", text::get_text_length()),
        ("text.prefix$", text::get_text_prefix()),
        ("top$", stack::get_top()),
        ("type$", entry::get_type()),
        ("warning$", io::get_warning()),
        ("while$", control::get_while()),
        ("width$", text::get_width()),
        ("write$", io::get_write()),
    ])
}

/// Declares the variables that every BibTeX style has.
///
/// These are the globals `global.max$` and `entry.max$`,
///     the entry string `sort.key$` and the entry field `crossref`.
pub fn register_defaults(processor: &mut Processor) {
    processor.add_global_integer("global.max$", GLOBAL_MAX, None);
    processor.add_global_integer("entry.max$", ENTRY_MAX, None);
    processor.add_entry_string("sort.key$", None);
    processor.add_entry_field(exbib::entry::CROSSREF, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib::code::Code;
    use exbib_testing::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn every_built_in_is_documented() {
        for (name, built_in) in built_in_functions() {
            assert!(built_in.doc().is_some(), "{name} has no documentation");
        }
    }

    const BOOK: &str = r#"
        author #1 "{ff~}{vv~}{ll}" format.name$ write$
        ". " write$
        title "t" change.case$ write$
        ", " write$
        year write$
        "." write$
        newline$
    "#;

    fn new_processor() -> (Processor, Rc<RefCell<Vec<u8>>>) {
        let mut processor = Processor::new(built_in_functions());
        let output = Rc::new(RefCell::new(Vec::<u8>::new()));
        processor.output = output.clone();
        processor.terminal_out = Rc::new(RefCell::new(std::io::sink()));
        register_defaults(&mut processor);
        for field in ["author", "title", "year"] {
            processor.add_entry_field(field, None);
        }
        processor.add_function("book", Code::Function(read_program(BOOK).unwrap()), None);
        let default_type = read_program(r#"cite$ " has an unknown type" * warning$"#).unwrap();
        processor.add_function("default.type", Code::Function(default_type), None);
        (processor, output)
    }

    #[test]
    fn format_entries_end_to_end() {
        let (mut processor, output) = new_processor();
        processor.database_mut().insert(
            Entry::new("Book", "knuth", None)
                .with_field("author", "Donald E. Knuth and Leslie Lamport")
                .with_field("title", "THE {TeX}BOOK")
                .with_field("year", "1984"),
        );
        processor.database_mut().insert(Entry::new("misc", "other", None));
        let iterate = read_program("call.type$").unwrap();
        assert!(processor.undefined_functions(&iterate).is_empty());
        let entries = processor.database().entries().to_vec();
        for entry in &entries {
            processor.execute(&iterate, Some(entry.as_ref())).unwrap();
        }
        assert_eq!(
            String::from_utf8(output.borrow().clone()).unwrap(),
            "Donald~E. Knuth. The {TeX}book, 1984.\n"
        );
        assert_eq!(processor.warnings(), 1);
        assert!(processor.stack().is_empty());
    }

    #[test]
    fn undefined_functions_are_reported_before_running() {
        let (processor, _) = new_processor();
        let program = read_program("title write$ { journal } 'volume if$").unwrap();
        let mut undefined: Vec<String> = processor
            .undefined_functions(&program)
            .iter()
            .map(|name| name.to_string())
            .collect();
        undefined.sort();
        assert_eq!(undefined, vec!["journal", "volume"]);
    }

    fn defaults(processor: &mut Processor) {
        register_defaults(processor);
    }

    fn inbook() -> Entry {
        Entry::new("inbook", "part", None).with_field("crossref", "WHOLE")
    }

    test_suite![
        options(
            TestOption::BuiltInFunctions(built_in_functions),
            TestOption::CustomProcessorInitialization(defaults),
            TestOption::Entry(inbook),
        ),
        stack_tests(
            (global_max, "global.max$", "#20000"),
            (entry_max, "entry.max$", "#250"),
            (sort_key, r#""knuth" 'sort.key$ := sort.key$"#, r#""knuth""#),
            (crossref_is_lowercased, "crossref", r#""whole""#),
            (
                substring_of_purified,
                r#""{\'E}mile Zola" purify$ #1 #5 substring$"#,
                r#""Emile""#
            ),
            (
                text_length_of_formatted_name,
                r#""Jean-Pierre Serre" #1 "{f.~}{ll}" format.name$ text.length$"#,
                "#11"
            ),
        ),
        output_tests(
            (
                add_period_and_write,
                r#""A title" add.period$ write$"#,
                "A title."
            ),
            (
                quote_concatenation,
                r#"quote$ "x" * quote$ * write$"#,
                "\"x\""
            ),
        ),
        failure_tests(
            (assign_to_field, r#""x" 'crossref :="#),
            (assign_to_built_in, r#""x" 'write$ :="#),
        ),
        serde_tests(
            (
                serde_formatted_name,
                r#""Jean-Pierre Serre" #1 "{f.~}{ll}" format.name$ write$"#
            ),
            (
                serde_conditional,
                r#"crossref empty$ { "none" } { crossref "u" change.case$ } if$ #-1 'sort.key$"#
            ),
        ),
    ];
}
