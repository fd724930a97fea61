//! # Structural Equality
//!
//! Deep equality as JSON Schema defines it for `enum`, `const` and
//! `uniqueItems`: numbers compare by value ([`crate::number::equal`]),
//! objects compare as unordered key sets, arrays compare positionally.
//!
//! `serde_json::Value`'s own `PartialEq` is unsuitable here: it treats `1`
//! and `1.0` as different and, with `preserve_order`, is order-sensitive for
//! objects.

use serde_json::Value;

use crate::number;

/// JSON Schema equality of two values.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number::equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| json_equal(xv, yv)))
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

/// Index pairs `(i, j)`, `i < j`, of the first duplicate found in `items`.
///
/// Pairwise comparison keeps this independent of ordering and of any
/// hashing scheme for numbers.
pub fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, a)| {
        items[i + 1..]
            .iter()
            .position(|b| json_equal(a, b))
            .map(|offset| (i, i + 1 + offset))
    })
}
