// Diagnostics: syntax, scope, limit and constructor errors.
use crate::test::compile_error;
use crate::LuaVM;

#[test]
fn test_unclosed_paren() {
    let err = compile_error("return (1");
    assert!(err.contains("')' expected"), "got: {}", err);
}

#[test]
fn test_unclosed_paren_reports_opening_line() {
    let err = compile_error("return (1 +\n2\n");
    assert!(err.contains("to close '(' at line 1"), "got: {}", err);
}

#[test]
fn test_missing_then() {
    let err = compile_error("if 1 end");
    assert!(err.contains("'then' expected"), "got: {}", err);
}

#[test]
fn test_missing_end_reports_opener() {
    let err = compile_error("while 1 do\nf()\n");
    assert!(err.contains("to close 'while' at line 1"), "got: {}", err);
}

#[test]
fn test_missing_local_name() {
    let err = compile_error("local 1");
    assert!(err.contains("<name> expected"), "got: {}", err);
}

#[test]
fn test_unexpected_symbol() {
    let err = compile_error("return )");
    assert!(err.contains("unexpected symbol"), "got: {}", err);
}

#[test]
fn test_error_carries_chunk_and_line() {
    let err = compile_error("f()\ng(");
    assert!(err.starts_with("chunk:2:"), "got: {}", err);
}

#[test]
fn test_trailing_garbage_after_return() {
    let err = compile_error("return 1 return 2");
    assert!(err.contains("'<eof>' expected"), "got: {}", err);
}

#[test]
fn test_assignment_to_call() {
    let err = compile_error("f() = 1");
    assert!(err.contains("unexpected symbol"), "got: {}", err);
}

#[test]
fn test_assignment_to_parenthesized_value() {
    let err = compile_error("(a) = 1");
    assert!(err.contains("cannot assign"), "got: {}", err);
}

#[test]
fn test_bare_expression_statement() {
    let err = compile_error("a");
    assert!(err.contains("'=' expected"), "got: {}", err);
}

#[test]
fn test_nested_function_statement_rejected() {
    let err = compile_error("function f() function g() end end");
    assert!(err.contains("top level"), "got: {}", err);
}

#[test]
fn test_function_statement_inside_block_rejected() {
    let err = compile_error("do function f() end end");
    assert!(err.contains("top level"), "got: {}", err);
}

#[test]
fn test_constructor_two_list_halves() {
    let err = compile_error("local t = {1, 2; 3, 4}");
    assert!(err.contains("constructor"), "got: {}", err);
}

#[test]
fn test_constructor_two_record_halves() {
    let err = compile_error("local t = {a = 1; b = 2}");
    assert!(err.contains("constructor"), "got: {}", err);
}

#[test]
fn test_constructor_mixed_halves_allowed() {
    let mut vm = LuaVM::new();
    assert!(vm.compile("local t = {1, 2; a = 1}").is_ok());
    assert!(vm.compile("local t = {a = 1; 1, 2}").is_ok());
    assert!(vm.compile("local t = {}").is_ok());
    assert!(vm.compile("local t = {;}").is_ok());
    assert!(vm.compile("local t = {1, 2}").is_ok());
    assert!(vm.compile("local t = {[1] = 'x', b = 2}").is_ok());
}

#[test]
fn test_too_many_locals() {
    let mut src = String::new();
    for i in 0..33 {
        src.push_str(&format!("local v{} = 0 ", i));
    }
    let err = compile_error(&src);
    assert!(err.contains("too many local variables"), "got: {}", err);
}

#[test]
fn test_too_many_assignment_targets() {
    let names: Vec<String> = (0..17).map(|i| format!("t{}", i)).collect();
    let src = format!("{} = 1", names.join(", "));
    let err = compile_error(&src);
    assert!(err.contains("multiple assignment"), "got: {}", err);
}

#[test]
fn test_expression_too_complex() {
    let src = format!("return {}1", "not ".repeat(25));
    let err = compile_error(&src);
    assert!(err.contains("too complex"), "got: {}", err);
}

#[test]
fn test_while_condition_too_complex() {
    let cond = vec!["1"; 160].join(" + ");
    let src = format!("while {} do end", cond);
    let err = compile_error(&src);
    assert!(err.contains("'while' condition too complex"), "got: {}", err);
}

#[test]
fn test_unfinished_string() {
    let err = compile_error("return 'abc");
    assert!(err.contains("unfinished string"), "got: {}", err);
}

#[test]
fn test_unfinished_long_string() {
    let err = compile_error("return [[abc");
    assert!(err.contains("unfinished long string"), "got: {}", err);
}

#[test]
fn test_malformed_number() {
    let err = compile_error("return 12abc");
    assert!(err.contains("malformed number"), "got: {}", err);
}

#[test]
fn test_invalid_escape() {
    let err = compile_error(r#"return "a\qb""#);
    assert!(err.contains("invalid escape sequence"), "got: {}", err);
}

#[test]
fn test_lone_tilde() {
    let err = compile_error("return 1 ~ 2");
    assert!(err.contains("'<eof>' expected"), "got: {}", err);
}

#[test]
fn test_first_error_wins() {
    // both lines are bad; the first one is reported
    let err = compile_error("local 1\nreturn )");
    assert!(err.starts_with("chunk:1:"), "got: {}", err);
}
