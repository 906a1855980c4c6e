//! Deep structural equality used by `toBe`, `toContain`, and the mock
//! call matchers.
//!
//! Maps are compared with a one-directional subset check: every key of
//! the left operand must map to an equal value on the right, while keys
//! present only on the right are ignored. This asymmetry is a contract,
//! not an oversight; it is what makes partial-match expectations such as
//! `expect(config).to_be(partial)` work.

use crate::values::Value;

/// Structural equality, rules applied in order:
///
/// 1. scalar/identity equality (callables by pointer identity, integers
///    and floats cross-compared numerically),
/// 2. vectors: same length, elements pairwise equal,
/// 3. timestamps: both parse to a valid instant and the instants match;
///    an unparseable timestamp is never equal to anything, including
///    another unparseable one,
/// 4. maps: left-to-right subset as described above, a missing right
///    key comparing as `Nil`,
/// 5. otherwise false.
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Vector(xs), Value::Vector(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Timestamp(_), Value::Timestamp(_)) => match (a.instant(), b.instant()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::Map(xs), Value::Map(ys)) => xs
            .iter()
            .all(|(key, x)| deep_eq(x, ys.get(key).unwrap_or(&Value::Nil))),
        (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
            *i as f64 == *f
        }
        _ => a == b,
    }
}
