//! Assignment to variables

use exbib::code::BuiltIn;
use exbib::error::Error;
use exbib::prelude::*;
use exbib::token;

/// Get the `:=` built-in function.
pub fn get_assign() -> BuiltIn {
    BuiltIn::new(assign_fn).with_doc(
        "Pop a quoted variable name and a value, and assign the value to the variable

Global variables and the integer and string variables of the current entry can be assigned.",
    )
}

fn assign_fn(processor: &mut Processor, entry: Option<&Entry>, locator: Option<&Locator>) -> Result<()> {
    let target = processor.pop()?;
    let token::Kind::Literal(name) = target.kind() else {
        return Err(Error::type_mismatch(
            "a function literal",
            &target,
            target.locator().or(locator),
        ));
    };
    let value = processor.pop()?;
    processor.assign(name, value, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exbib::error;
    use exbib_testing::*;
    use std::collections::HashMap;

    fn built_in_functions() -> HashMap<&'static str, BuiltIn> {
        HashMap::from([
            (":=", get_assign()),
            ("write$", crate::io::get_write()),
        ])
    }

    fn declare_variables(processor: &mut Processor) {
        processor.add_global_integer("count", 0, None);
        processor.add_global_string("label", "", None);
        processor.add_entry_integer("n", None);
        processor.add_entry_string("s", None);
        processor.add_entry_field("title", None);
    }

    fn bible() -> Entry {
        Entry::new("book", "bible", None).with_field("title", "The Bible")
    }

    #[test]
    fn assign_builtin_is_rejected() {
        let mut processor = Processor::new(built_in_functions());
        processor.push(Token::new_string("x", None));
        processor.push(Token::new_literal("write$", None).unwrap());
        let err = processor.call(":=", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::NotAssignable { .. }));
    }

    #[test]
    fn assign_to_string_is_a_type_error() {
        let mut processor = Processor::new(built_in_functions());
        processor.push(Token::new_integer(1, None));
        processor.push(Token::new_string("count", None));
        let err = processor.call(":=", None).unwrap_err();
        assert!(matches!(err.kind(), error::Kind::TypeMismatch { .. }));
    }

    test_suite![
        options(
            TestOption::BuiltInFunctions(built_in_functions),
            TestOption::CustomProcessorInitialization(declare_variables),
            TestOption::Entry(bible),
        ),
        stack_tests(
            (global_integer, "#7 'count := count", "#7"),
            (global_string, r#""x" 'label := label"#, r#""x""#),
            (entry_integer, "#-2 'n := n", "#-2"),
            (entry_string, r#""y" 's := s"#, r#""y""#),
            (reassign, "#1 'count := #2 'count := count", "#2"),
            (unassigned_entry_integer, "n", "#0"),
        ),
        output_tests((assign_then_write, r#""z" 'label := label write$"#, "z"),),
        failure_tests(
            (integer_to_string_variable, "#1 'label :="),
            (string_to_integer_variable, r#""1" 'count :="#),
            (assign_field, r#""x" 'title :="#),
            (assign_undefined, "#1 'nothing :="),
            (missing_value, "'count :="),
        ),
    ];
}
