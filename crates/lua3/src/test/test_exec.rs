// End-to-end programs: compile on a fresh VM, execute, check results.
use crate::test::{run_chunk, run_number, run_one, run_string};
use crate::{LuaVM, LuaValue};

#[test]
fn test_arithmetic_chain() {
    let src = "return 1 + 2 * 3";
    assert_eq!(run_number(src), 7.0);
    let chunk = crate::test::compile_chunk(src);
    assert!(chunk.code.len() <= src.len());
}

#[test]
fn test_local_surplus_values_popped() {
    let src = "local a, b = 1, 2, 3 return a + b";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_local_missing_values_are_nil() {
    let src = "local a, b, c = 1 return b";
    assert!(run_one(src).is_nil());
}

#[test]
fn test_mixed_constructor() {
    let src = "local t = {10, 20, 30; x = 1} return t[2] + t.x";
    assert_eq!(run_number(src), 21.0);
}

#[test]
fn test_while_concat_loop() {
    let src = "local s = '' local i = 1 while i <= 3 do s = s .. i i = i + 1 end return s";
    assert_eq!(run_string(src), "123");
}

#[test]
fn test_closure_upvalue() {
    let src = "function f(x) return function(y) return %x + y end end return f(10)(32)";
    assert_eq!(run_number(src), 42.0);
}

#[test]
fn test_scenarios_stay_compact() {
    for src in [
        "return 1 + 2 * 3",
        "local a, b = 1, 2, 3 return a + b",
        "local a, b, c = 1 return b",
        "local t = {10, 20, 30; x = 1} return t[2] + t.x",
        "local s = '' local i = 1 while i <= 3 do s = s .. i i = i + 1 end return s",
        "function f(x) return function(y) return %x + y end end return f(10)(32)",
    ] {
        let chunk = crate::test::compile_chunk(src);
        assert!(
            chunk.code.len() <= src.len(),
            "emitted {} instructions for {} source bytes",
            chunk.code.len(),
            src.len()
        );
    }
}

#[test]
fn test_empty_chunk() {
    assert!(run_chunk("").is_empty());
    assert!(run_chunk(";;;").is_empty());
}

#[test]
fn test_return_no_values() {
    assert!(run_chunk("return").is_empty());
}

#[test]
fn test_multiple_returns() {
    let values = run_chunk("return 1, 2, 3");
    assert_eq!(values.len(), 3);
    assert_eq!(values[2].as_number(), Some(3.0));
}

#[test]
fn test_if_branches() {
    assert_eq!(run_number("if 1 then return 10 else return 20 end"), 10.0);
    assert_eq!(run_number("if nil then return 10 else return 20 end"), 20.0);
    assert_eq!(
        run_number("local x = 2 if x == 1 then return 1 elseif x == 2 then return 2 else return 3 end"),
        2.0
    );
    assert_eq!(
        run_number("local x = 9 if x == 1 then return 1 elseif x == 2 then return 2 else return 3 end"),
        3.0
    );
}

#[test]
fn test_if_without_else() {
    assert_eq!(run_number("if nil then end return 5"), 5.0);
    // an empty else part exercises the over-jump deletion
    assert_eq!(run_number("if nil then return 1 else end return 2"), 2.0);
}

#[test]
fn test_repeat_until() {
    let src = "local i = 0 repeat i = i + 1 until i >= 3 return i";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_while_false_never_runs() {
    let src = "local n = 0 while nil do n = 1 end return n";
    assert_eq!(run_number(src), 0.0);
}

#[test]
fn test_nested_while() {
    let src = "local total = 0 local i = 1 while i <= 3 do local j = 1 while j <= 3 do total = total + 1 j = j + 1 end i = i + 1 end return total";
    assert_eq!(run_number(src), 9.0);
}

#[test]
fn test_do_block_scoping() {
    let src = "local x = 1 do local x = 2 end return x";
    assert_eq!(run_number(src), 1.0);
}

#[test]
fn test_early_return_from_block() {
    assert_eq!(run_number("do return 7 end return 8"), 7.0);
}

#[test]
fn test_multiple_assignment_swap() {
    let src = "a, b = 1, 2 a, b = b, a return a, b";
    let values = run_chunk(src);
    assert_eq!(values[0].as_number(), Some(2.0));
    assert_eq!(values[1].as_number(), Some(1.0));
}

#[test]
fn test_call_statement_discards_results() {
    let src = "function f() return 1, 2 end f() return 9";
    assert_eq!(run_number(src), 9.0);
}

#[test]
fn test_call_spread_into_locals() {
    let src = "function f() return 1, 2 end local a, b, c = f() return c";
    assert!(run_one(src).is_nil());
    let src = "function f() return 1, 2, 3 end local a, b = f() return a + b";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_call_all_results_forwarded() {
    let src = "function f() return 1, 2 end function g(a, b) return a + b end return g(f())";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_vararg_arg_table() {
    let src = "function f(...) return arg.n, arg[1], arg[2] end return f(7, 8)";
    let values = run_chunk(src);
    assert_eq!(values[0].as_number(), Some(2.0));
    assert_eq!(values[1].as_number(), Some(7.0));
    assert_eq!(values[2].as_number(), Some(8.0));
}

#[test]
fn test_vararg_after_named_params() {
    let src = "function f(a, ...) return a + arg.n end return f(10, 1, 2, 3)";
    assert_eq!(run_number(src), 13.0);
}

#[test]
fn test_function_expression_in_local() {
    let src = "local add = function(a, b) return a + b end return add(2, 3)";
    assert_eq!(run_number(src), 5.0);
}

#[test]
fn test_recursive_global_function() {
    let src = "function fact(n) if n <= 1 then return 1 end return n * fact(n - 1) end return fact(6)";
    assert_eq!(run_number(src), 720.0);
}

#[test]
fn test_dotted_function_definition() {
    let src = "lib = {} function lib.double(n) return n + n end return lib.double(21)";
    assert_eq!(run_number(src), 42.0);
}

#[test]
fn test_method_definition_and_call() {
    let src = "obj = {x = 40} function obj:get() return self.x + 2 end return obj:get()";
    assert_eq!(run_number(src), 42.0);
}

#[test]
fn test_string_argument_call_sugar() {
    let src = "function id(s) return s end return id 'hello'";
    assert_eq!(run_string(src), "hello");
}

#[test]
fn test_table_argument_call_sugar() {
    let src = "function first(t) return t[1] end return first {11, 22}";
    assert_eq!(run_number(src), 11.0);
}

#[test]
fn test_long_string_literal() {
    let src = "return [[hello\nworld]]";
    assert_eq!(run_string(src), "hello\nworld");
}

#[test]
fn test_string_escapes() {
    assert_eq!(run_string(r#"return "a\tb\n\65""#), "a\tb\nA");
}

#[test]
fn test_stdlib_basics() {
    assert_eq!(run_string("return type({})"), "table");
    assert_eq!(run_string("return type('x')"), "string");
    assert_eq!(run_number("return tonumber('25')"), 25.0);
    assert!(run_one("return tonumber('bogus')").is_nil());
    assert_eq!(run_string("return tostring(12)"), "12");
}

#[test]
fn test_runtime_error_on_calling_nil() {
    let mut vm = LuaVM::new();
    let err = vm.execute_string("undefined_name()").unwrap_err();
    assert!(err.to_string().contains("attempt to call a nil value"));
}

#[test]
fn test_runtime_error_carries_line_with_debug_info() {
    let mut vm = LuaVM::new();
    vm.set_debug_info(true);
    let err = vm
        .execute_string("local x = 1\nreturn x + {}")
        .unwrap_err();
    assert!(err.to_string().contains(":2:"), "got: {}", err);
}

#[test]
fn test_globals_visible_after_execution() {
    let mut vm = LuaVM::new();
    vm.execute_string("answer = 42").unwrap();
    assert_eq!(vm.get_global("answer").as_number(), Some(42.0));
}

#[test]
fn test_comments_are_skipped() {
    let src = "-- leading comment\nreturn 3 -- trailing";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_deep_recursion_overflows_cleanly() {
    let mut vm = LuaVM::new();
    let err = vm
        .execute_string("function f() return f() end return f()")
        .unwrap_err();
    assert!(err.to_string().contains("stack overflow"), "got: {}", err);
}

#[test]
fn test_debug_info_records_locals() {
    let mut vm = LuaVM::new();
    vm.set_debug_info(true);
    let chunk = vm.compile("local a = 1\nlocal b = 2\nreturn a").unwrap();
    let locvars = chunk.locvars.as_ref().expect("debug vector present");
    let names: Vec<_> = locvars
        .iter()
        .filter_map(|v| v.name.as_ref().map(|n| n.as_str().to_string()))
        .collect();
    assert_eq!(names, ["a", "b"]);
    // the vector ends with the unnamed sentinel
    assert!(locvars.last().unwrap().name.is_none());

    let plain = LuaVM::new().compile("local a = 1").unwrap();
    assert!(plain.locvars.is_none());
}

#[test]
fn test_debug_info_marks_block_exit() {
    let mut vm = LuaVM::new();
    vm.set_debug_info(true);
    let chunk = vm.compile("do local x = 1 end return 1").unwrap();
    let locvars = chunk.locvars.as_ref().unwrap();
    // declaration, block close marker, sentinel
    assert_eq!(locvars.len(), 3);
    assert!(locvars[0].name.is_some());
    assert!(locvars[1].name.is_none());
}

#[test]
fn test_execute_helper() {
    let values = crate::execute("return 1 + 1").unwrap();
    assert_eq!(values[0], LuaValue::Number(2.0));
}

#[test]
fn test_disassembler_output() {
    let chunk = crate::test::compile_chunk("return 1 + 2 * 3");
    let listing = chunk.disassemble();
    assert!(listing.contains("PUSHINT"));
    assert!(listing.contains("MULTOP"));
    assert!(listing.contains("RETCODE"));
}
