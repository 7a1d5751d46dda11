// Table constructors, indexing and bulk initialisation.
use crate::test::{compile_chunk, opcodes, run_number, run_one, run_string};
use crate::{Instruction, OpCode};

#[test]
fn test_empty_table() {
    assert_eq!(run_string("local t = {} return type(t)"), "table");
}

#[test]
fn test_list_constructor() {
    assert_eq!(run_number("local t = {5, 6, 7} return t[1] + t[3]"), 12.0);
}

#[test]
fn test_record_constructor() {
    assert_eq!(run_number("local t = {a = 1, b = 2} return t.a + t.b"), 3.0);
}

#[test]
fn test_record_with_bracket_keys() {
    assert_eq!(run_number("local t = {[1 + 1] = 5} return t[2]"), 5.0);
    assert_eq!(run_number("local t = {['k'] = 3} return t.k"), 3.0);
}

#[test]
fn test_record_then_list() {
    assert_eq!(run_number("local t = {a = 9; 1, 2} return t.a + t[2]"), 11.0);
}

#[test]
fn test_list_flush_batches() {
    // 70 items forces one full SETLIST batch plus a remainder batch
    let items: Vec<String> = (1..=70).map(|i| i.to_string()).collect();
    let src = format!("local t = {{{}}} return t[1] + t[64] + t[65] + t[70]", items.join(", "));
    assert_eq!(run_number(&src), 1.0 + 64.0 + 65.0 + 70.0);

    let chunk = compile_chunk(&format!("local t = {{{}}}", items.join(", ")));
    let batches: Vec<(u32, u32)> = chunk
        .code
        .iter()
        .filter(|&&inst| Instruction::get_opcode(inst) == Some(OpCode::SetList))
        .map(|&inst| (Instruction::get_a(inst), Instruction::get_b(inst)))
        .collect();
    assert_eq!(batches, [(0, 63), (1, 5)]);
}

#[test]
fn test_record_flush_batches() {
    let fields: Vec<String> = (1..=40).map(|i| format!("k{} = {}", i, i)).collect();
    let src = format!("local t = {{{}}} return t.k1 + t.k40", fields.join(", "));
    assert_eq!(run_number(&src), 41.0);

    let chunk = compile_chunk(&format!("local t = {{{}}}", fields.join(", ")));
    let flushes: Vec<u32> = chunk
        .code
        .iter()
        .filter(|&&inst| Instruction::get_opcode(inst) == Some(OpCode::SetMap))
        .map(|&inst| Instruction::get_u(inst))
        .collect();
    assert_eq!(flushes, [31, 7]);
}

#[test]
fn test_nested_constructors() {
    assert_eq!(
        run_number("local t = {inner = {val = 4}} return t.inner.val"),
        4.0
    );
    assert_eq!(run_number("local t = {{1}, {2}} return t[2][1]"), 2.0);
}

#[test]
fn test_index_assignment() {
    assert_eq!(run_number("local t = {} t[3] = 30 return t[3]"), 30.0);
    assert_eq!(run_number("local t = {} t.key = 5 return t.key"), 5.0);
    assert_eq!(
        run_number("local t = {} t['a' .. 'b'] = 8 return t.ab"),
        8.0
    );
}

#[test]
fn test_multiple_indexed_assignment() {
    let src = "local t = {} local u = {} t[1], u[2] = 10, 20 return t[1] + u[2]";
    assert_eq!(run_number(src), 30.0);
    let src = "local t = {} local x = 0 x, t[1] = 5, 6 return x + t[1]";
    assert_eq!(run_number(src), 11.0);
    let src = "local t = {} t.a, t.b, t.c = 1, 2 return t.a + t.b";
    assert_eq!(run_number(src), 3.0);
}

#[test]
fn test_missing_key_is_nil() {
    assert!(run_one("local t = {} return t.missing").is_nil());
    assert!(run_one("local t = {1} return t[2]").is_nil());
}

#[test]
fn test_assigning_nil_removes() {
    let src = "local t = {a = 1} t.a = nil return t.a";
    assert!(run_one(src).is_nil());
}

#[test]
fn test_string_and_number_keys_are_distinct() {
    let src = "local t = {} t[1] = 'num' t['1'] = 'str' return t[1] .. t['1']";
    assert_eq!(run_string(src), "numstr");
}

#[test]
fn test_table_as_key() {
    let src = "local k = {} local t = {} t[k] = 7 return t[k]";
    assert_eq!(run_number(src), 7.0);
}

#[test]
fn test_chained_indexing_through_calls() {
    let src = "function make() return {x = 6} end return make().x";
    assert_eq!(run_number(src), 6.0);
}

#[test]
fn test_constructor_hint_matches_counts() {
    let chunk = compile_chunk("local t = {1, 2, 3}");
    let ops = opcodes(&chunk);
    assert!(ops.contains(&OpCode::CreateTable));
    assert!(ops.contains(&OpCode::SetList));
}
