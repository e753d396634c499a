//! Property-based tests for the round-trip-numeral and operator-precedence
//! invariants named in §8, in the `proptest` style `faxc-lex` uses for its
//! own lexer (arbitrary-input properties rather than a fixed example
//! table).

use proptest::prelude::*;
use wisp::{Engine, Value};

proptest! {
    /// Round-trip numerals (§8): parsing the canonical decimal rendering of
    /// any finite `f64` in a sane magnitude range yields a `number` within
    /// 1 ulp of the original.
    #[test]
    fn roundtrip_numeral_within_one_ulp(n in -1.0e12f64..1.0e12) {
        let engine = Engine::default();
        let src = format!("{n}");
        let result = engine.eval(&src);
        match result {
            Value::Number(got) => {
                let diff = (got - n).abs();
                let ulp = n.abs().max(1.0) * f64::EPSILON;
                prop_assert!(diff <= ulp.max(1e-9), "got {got}, expected {n}");
            }
            other => prop_assert!(false, "expected a number, got {other:?}"),
        }
    }

    /// Operator precedence (§8): `a + b * c == a + (b * c)` for arbitrary
    /// small integers, i.e. `*` binds tighter than `+` regardless of the
    /// operand values chosen.
    #[test]
    fn multiplication_binds_tighter_than_addition(a in -50i64..50, b in -50i64..50, c in -50i64..50) {
        let engine = Engine::default();
        let unparenthesized = engine.eval(&format!("{a} + {b} * {c}"));
        let parenthesized = engine.eval(&format!("{a} + ({b} * {c})"));
        prop_assert_eq!(unparenthesized, parenthesized);
    }

    /// `(a + b) * c` must differ from `a + b * c` whenever `c != 1` and
    /// `a*(c-1) != 0`, confirming precedence actually changes the parse
    /// rather than both forms coincidentally agreeing.
    #[test]
    fn explicit_grouping_overrides_default_precedence(a in 1i64..20, b in 1i64..20, c in 2i64..20) {
        let engine = Engine::default();
        let grouped = engine.eval(&format!("({a} + {b}) * {c}"));
        let ungrouped = engine.eval(&format!("{a} + {b} * {c}"));
        prop_assert_ne!(grouped, ungrouped);
    }

    /// Range construction (§4.5, §8) always produces an inclusive,
    /// ascending run of integers for any valid `a <= b` pair.
    #[test]
    fn range_construction_is_inclusive_and_ascending(a in -100i64..100, len in 0i64..50) {
        let b = a + len;
        let engine = Engine::default();
        let result = engine.eval(&format!("{a}:{b}"));
        match result {
            Value::Array(items) => {
                prop_assert_eq!(items.len() as i64, len + 1);
                for (i, item) in items.iter().enumerate() {
                    prop_assert_eq!(item, &Value::Number((a + i as i64) as f64));
                }
            }
            other => prop_assert!(false, "expected an array, got {other:?}"),
        }
    }
}
