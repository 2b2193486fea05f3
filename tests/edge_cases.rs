//! Lexical corner cases, value rendering and pretty-printing

mod common;
use common::*;

use a9::diagnostic::SourceId;
use a9::format::format_program;
use a9::interpreter::{parse_program, Interpreter};
use a9::Value;

// =============================================================================
// LEXICAL
// =============================================================================

#[test]
fn test_comments_everywhere() {
    let source = r#"
        # header
        {def # after the brace
            {f x} # after the head
            = {+ x # between arguments
                 1}} # trailing
    "#;
    assert_eq!(eval(source, "{f 1}"), num(2.0));
}

#[test]
fn test_no_whitespace_needed_around_brackets() {
    assert_eq!(eval("{def{f x}={+ x x}}", "{f 2}"), num(4.0));
    assert_eq!(eval("{def {f} = {{+ a 1}where{[a:=1]}}}", "f"), num(2.0));
}

#[test]
fn test_both_quote_styles() {
    let source = r#"{def {q} = {++ 'say "hi"' " it's"}}"#;
    assert_eq!(eval(source, "q"), string("say \"hi\" it's"));
}

#[test]
fn test_strings_keep_backslashes() {
    let source = r#"{def {s} = "a\nb"}"#;
    assert_eq!(eval(source, "s").to_string(), "a\\nb");
}

#[test]
fn test_multiline_string() {
    let source = "{def {s} = \"line one\nline two\"}";
    assert_eq!(eval(source, "s"), string("line one\nline two"));
}

#[test]
fn test_identifiers_with_digits_and_underscores() {
    let source = "{def {add_2 x_1} = {+ x_1 2}}";
    assert_eq!(eval(source, "{add_2 40}"), num(42.0));
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(eval_err("{def {if} = 1}", "1").to_string().contains("keyword `if`"));
}

// =============================================================================
// VALUE RENDERING
// =============================================================================

#[test]
fn test_number_rendering() {
    let source = "{def {unused} = 0}";
    assert_eq!(eval(source, "42").to_string(), "42");
    assert_eq!(eval(source, "42.0").to_string(), "42");
    assert_eq!(eval(source, "{/ 1 4}").to_string(), "0.25");
    assert_eq!(eval(source, "{* {- 0 1} 0}").to_string(), "0");
    assert_eq!(eval(source, "{- 0 2.5}").to_string(), "-2.5");
}

#[test]
fn test_string_rendering_is_unquoted() {
    assert_eq!(eval("{def {s} = 'hi'}", "s").to_string(), "hi");
}

#[test]
fn test_leading_zeros() {
    assert_eq!(eval("{def {n} = 007}", "n"), num(7.0));
}

// =============================================================================
// PROGRAM SCOPE
// =============================================================================

#[test]
fn test_definitions_listed_in_source_order() {
    let program = parse_program("{def {b} = 1} {def {a x} = x} {def {c} = 2}", SourceId(0)).unwrap();
    let interpreter = Interpreter::new(program).unwrap();
    let names: Vec<&str> = interpreter.definitions().map(|d| d.name.as_ref()).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
    assert!(interpreter.is_defined("a"));
    assert!(interpreter.is_defined("++"));
    assert!(!interpreter.is_defined("d"));
}

#[test]
fn test_failed_request_leaves_program_usable() {
    let program = parse_program("{def {half x} = {/ x 2}} {def {broken} = {/ 1 0}}", SourceId(0)).unwrap();
    let mut interpreter = Interpreter::new(program).unwrap();
    assert!(interpreter.call("broken", vec![]).is_err());
    assert!(interpreter.call("broken", vec![]).is_err());
    assert_eq!(interpreter.call("half", vec![Value::Number(9.0)]).unwrap(), num(4.5));
}

#[test]
fn test_call_builtin_by_name() {
    let program = parse_program("{def {unused} = 0}", SourceId(0)).unwrap();
    let mut interpreter = Interpreter::new(program).unwrap();
    let result = interpreter.call("++", vec![string("a"), num(1.0)]).unwrap();
    assert_eq!(result, string("a1"));
}

// =============================================================================
// PRETTY-PRINTING
// =============================================================================

fn canonical(source: &str) -> String {
    format_program(&parse_program(source, SourceId(0)).expect("program should parse"))
}

#[test]
fn test_pretty_print_is_stable() {
    let once = canonical(PRELUDE_DEMO);
    assert_eq!(canonical(&once), once);
    assert_eq!(once.lines().count(), 7);
}

#[test]
fn test_pretty_printed_program_behaves_the_same() {
    let once = canonical(PRELUDE_DEMO);
    assert_eq!(eval(&once, "{fact 6}"), eval(PRELUDE_DEMO, "{fact 6}"));
    assert_eq!(eval(&once, "{{twice double} 3}"), num(12.0));
}

#[test]
fn test_parsing_is_deterministic() {
    let first = parse_program(PRELUDE_DEMO, SourceId(0)).unwrap();
    let second = parse_program(PRELUDE_DEMO, SourceId(0)).unwrap();
    assert_eq!(first, second);
}
