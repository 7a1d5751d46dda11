// Property tests: randomly generated programs keep the compiler's
// structural invariants.
use proptest::prelude::*;

use crate::test::run_number;
use crate::{Instruction, LuaVM, OpCode};

#[derive(Debug, Clone)]
enum Expr {
    Num(i32),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Num(n) => n.to_string(),
            Expr::Add(a, b) => format!("({} + {})", a.render(), b.render()),
            Expr::Sub(a, b) => format!("({} - {})", a.render(), b.render()),
            Expr::Mul(a, b) => format!("({} * {})", a.render(), b.render()),
        }
    }

    // mirrors the VM exactly: same f64 operations in the same order
    fn eval(&self) -> f64 {
        match self {
            Expr::Num(n) => *n as f64,
            Expr::Add(a, b) => a.eval() + b.eval(),
            Expr::Sub(a, b) => a.eval() - b.eval(),
            Expr::Mul(a, b) => a.eval() * b.eval(),
        }
    }
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = (0..100i32).prop_map(Expr::Num);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Expr::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Expr::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner)
                .prop_map(|(a, b)| Expr::Mul(Box::new(a), Box::new(b))),
        ]
    })
}

fn simulate_peak(code: &[u32]) -> i64 {
    let mut depth: i64 = 0;
    let mut peak: i64 = 0;
    for &inst in code {
        let delta = match Instruction::get_opcode(inst).unwrap() {
            OpCode::PushInt | OpCode::PushNum | OpCode::PushLocal => 1,
            OpCode::PushNil => Instruction::get_u(inst) as i64 + 1,
            OpCode::Pop => -(Instruction::get_u(inst) as i64),
            OpCode::Add | OpCode::Sub | OpCode::Mul => -1,
            OpCode::SetLocal => -1,
            OpCode::RetCode | OpCode::EndCode => 0,
            other => panic!("unexpected opcode in generated program: {:?}", other),
        };
        depth += delta;
        peak = peak.max(depth);
    }
    peak
}

proptest! {
    #[test]
    fn prop_expression_value_matches(e in arb_expr()) {
        let src = format!("return {}", e.render());
        prop_assert_eq!(run_number(&src), e.eval());
    }

    #[test]
    fn prop_declared_max_stack_is_sound(e in arb_expr()) {
        let src = format!("return {}", e.render());
        let mut vm = LuaVM::new();
        let chunk = vm.compile(&src).unwrap();
        let peak = simulate_peak(&chunk.code);
        prop_assert!(peak <= chunk.max_stack as i64);
    }

    #[test]
    fn prop_compilation_is_deterministic(e in arb_expr()) {
        let src = format!("return {}", e.render());
        let mut vm = LuaVM::new();
        let first = vm.compile(&src).unwrap();
        let second = vm.compile(&src).unwrap();
        prop_assert_eq!(first.code, second.code);
        prop_assert_eq!(first.max_stack, second.max_stack);
    }

    #[test]
    fn prop_locals_balance_across_statements(e in arb_expr(), extra in 1usize..5) {
        // every statement boundary re-checks the depth == locals
        // invariant via the compiler's own assertion
        let mut src = String::new();
        for i in 0..extra {
            src.push_str(&format!("local v{} = {} ", i, e.render()));
        }
        src.push_str(&format!("return v0 + {}", e.render()));
        prop_assert_eq!(run_number(&src), e.eval() + e.eval());
    }

    #[test]
    fn prop_same_name_interns_once(
        name in "[a-z][a-z0-9]{0,6}".prop_filter("not a keyword", |n| {
            !matches!(
                n.as_str(),
                "and" | "do" | "else" | "elseif" | "end" | "function" | "if" | "local"
                    | "nil" | "not" | "or" | "repeat" | "return" | "then" | "until" | "while"
            )
        }),
        uses in 2usize..6,
    ) {
        let mut src = String::new();
        for _ in 0..uses {
            src.push_str(&format!("{} = 1 ", name));
        }
        let mut vm = LuaVM::new();
        let chunk = vm.compile(&src).unwrap();
        let entries = chunk
            .strings
            .iter()
            .filter(|s| s.as_str() == name)
            .count();
        prop_assert_eq!(entries, 1);
    }
}
