// Operator semantics: precedence, associativity, short-circuiting,
// coercions, comparisons.
use crate::test::{run_number, run_one, run_string};

#[test]
fn test_precedence_levels() {
    assert_eq!(run_number("return 2 + 3 * 4"), 14.0);
    assert_eq!(run_number("return 2 * 3 + 4"), 10.0);
    assert_eq!(run_number("return 2 + 3 * 4 ^ 2"), 50.0);
    assert_eq!(run_number("return 10 - 4 - 3"), 3.0);
    assert_eq!(run_number("return 2 * (3 + 4)"), 14.0);
}

#[test]
fn test_pow_right_associative() {
    assert_eq!(run_number("return 2 ^ 3 ^ 2"), 512.0);
    assert_eq!(run_number("return (2 ^ 3) ^ 2"), 64.0);
}

#[test]
fn test_unary_minus_binds_looser_than_pow() {
    assert_eq!(run_number("return -2 ^ 2"), -4.0);
    assert_eq!(run_number("return (-2) ^ 2"), 4.0);
}

#[test]
fn test_unary_stacking() {
    assert_eq!(run_number("return - - 5"), 5.0);
    assert!(run_one("return not not nil").is_nil());
    assert_eq!(run_number("return not nil"), 1.0);
    assert!(run_one("return not 0").is_nil()); // 0 is true here
}

#[test]
fn test_comparisons_yield_one_or_nil() {
    assert_eq!(run_number("return 1 < 2"), 1.0);
    assert!(run_one("return 2 < 1").is_nil());
    assert_eq!(run_number("return 2 > 1"), 1.0);
    assert_eq!(run_number("return 2 >= 2"), 1.0);
    assert_eq!(run_number("return 2 <= 2"), 1.0);
    assert!(run_one("return 1 >= 2").is_nil());
    assert_eq!(run_number("return 1 ~= 2"), 1.0);
    assert!(run_one("return 1 == 2").is_nil());
}

#[test]
fn test_string_comparisons() {
    assert_eq!(run_number("return 'abc' < 'abd'"), 1.0);
    assert_eq!(run_number("return 'abc' == 'abc'"), 1.0);
    assert!(run_one("return 'b' < 'a'").is_nil());
}

#[test]
fn test_equality_is_identity_for_tables() {
    assert!(run_one("local a = {} local b = {} return a == b").is_nil());
    assert_eq!(run_number("local a = {} local b = a return a == b"), 1.0);
}

#[test]
fn test_comparison_binds_looser_than_concat() {
    // '..' is tighter: '1' .. '2' == '12'
    assert_eq!(run_number("return '1' .. '2' == '12'"), 1.0);
}

#[test]
fn test_and_or_values() {
    assert_eq!(run_number("return 1 and 2"), 2.0);
    assert!(run_one("return nil and 2").is_nil());
    assert_eq!(run_number("return nil or 5"), 5.0);
    assert_eq!(run_number("return 1 or 2"), 1.0);
    assert_eq!(run_number("return nil and 1 or 2"), 2.0);
    assert_eq!(run_number("return 1 and nil or 3"), 3.0);
}

#[test]
fn test_short_circuit_skips_evaluation() {
    let src = "hits = 0 function bump() hits = hits + 1 return 1 end local v = nil and bump() return hits";
    assert_eq!(run_number(src), 0.0);
    let src = "hits = 0 function bump() hits = hits + 1 return 1 end local v = 1 or bump() return hits";
    assert_eq!(run_number(src), 0.0);
    let src = "hits = 0 function bump() hits = hits + 1 return 1 end local v = 1 and bump() return hits";
    assert_eq!(run_number(src), 1.0);
}

#[test]
fn test_concat() {
    assert_eq!(run_string("return 'a' .. 'b' .. 'c'"), "abc");
    assert_eq!(run_string("return 1 .. 2"), "12");
    assert_eq!(run_string("return 'v' .. 1 + 1"), "v2");
    assert_eq!(run_string("return 1.5 .. ''"), "1.5");
}

#[test]
fn test_arith_string_coercion() {
    assert_eq!(run_number("return '10' + 5"), 15.0);
    assert_eq!(run_number("return '2' * '3'"), 6.0);
    assert_eq!(run_number("return -'4'"), -4.0);
}

#[test]
fn test_division_and_pow() {
    assert_eq!(run_number("return 10 / 4"), 2.5);
    assert_eq!(run_number("return 2 ^ 10"), 1024.0);
    assert_eq!(run_number("return 2 ^ -1"), 0.5);
}

#[test]
fn test_big_literals_roundtrip() {
    assert_eq!(run_number("return 123456789"), 123456789.0);
    assert_eq!(run_number("return 1e10"), 1e10);
    assert_eq!(run_number("return 2.5e-2"), 0.025);
    assert_eq!(run_number("return .5"), 0.5);
}
