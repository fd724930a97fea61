//! # Numeric Semantics
//!
//! JSON Schema treats numbers as mathematical values: `1` and `1.0` are the
//! same number even though the decoder keeps their literal kinds apart.
//! Comparisons here are exact when both operands are integers (including
//! values beyond `i64`, via `i128`) and fall back to `f64` otherwise.

use std::cmp::Ordering;

use serde_json::Number;

/// Smallest tolerance for `multipleOf` on non-integer operands.
///
/// Binary floating point cannot represent most decimal divisors exactly
/// (`0.3 / 0.1 == 2.9999999999999996`), so the quotient is accepted when it
/// lies close enough to an integer. The allowed distance grows with the
/// quotient, since its rounding error is relative to its magnitude.
pub const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Rounding error of `x / d` in units of the quotient's magnitude: one
/// representation error each for `x` and `d`, one for the division, with
/// headroom.
const QUOTIENT_RELATIVE_ERROR: f64 = 8.0 * f64::EPSILON;

/// Smallest positive integer literal the decoder cannot hold as `u64`.
const BEYOND_U64: f64 = 18_446_744_073_709_551_616.0;
/// Largest negative integer literal the decoder cannot hold as `i64`.
const BEYOND_I64: f64 = -9_223_372_036_854_775_808.0;

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Numeric ordering of two JSON numbers. `None` only for NaN, which the
/// decoder never produces.
pub fn compare(a: &Number, b: &Number) -> Option<Ordering> {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Numeric equality: `1 == 1.0`.
pub fn equal(a: &Number, b: &Number) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

/// True when the number has no fractional part, whatever its literal kind.
pub fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// True when the number was written as an integer literal.
///
/// Literals beyond the `i64`/`u64` range decode to `f64`; an integral value
/// out there is taken to be such a literal, since a float written that large
/// has no fractional digits left either.
pub fn is_integer_literal(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| {
        f.is_finite() && f.fract() == 0.0 && (f >= BEYOND_U64 || f < BEYOND_I64)
    })
}

/// True when `n` is an integer multiple of `divisor`.
///
/// Integer pairs use an exact remainder. Otherwise the quotient must lie
/// within [`MULTIPLE_OF_EPSILON`], or its own rounding error if larger, of an
/// integer; a quotient that overflows to infinity is never a multiple. A zero
/// divisor is never satisfied.
pub fn is_multiple_of(n: &Number, divisor: &Number) -> bool {
    if let (Some(x), Some(d)) = (as_i128(n), as_i128(divisor)) {
        return d != 0 && x % d == 0;
    }
    let (Some(x), Some(d)) = (n.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 {
        return false;
    }
    let quotient = x / d;
    if !quotient.is_finite() {
        return false;
    }
    let tolerance = MULTIPLE_OF_EPSILON.max(quotient.abs() * QUOTIENT_RELATIVE_ERROR);
    (quotient - quotient.round()).abs() <= tolerance
}
