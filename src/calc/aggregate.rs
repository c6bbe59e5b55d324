//! Remainder computation: `main - sum(parts)` under a clamping policy.

use super::coerce::{NumberLike, coerce};

/// Number of decimal places every derived value is rounded to.
pub const ROUND_DECIMALS: usize = 3;

/// Returns `main` minus the sum of `parts`, rounded to [`ROUND_DECIMALS`].
///
/// `main` is a hard dependency: when it does not coerce to a number the
/// result is `None`. Parts that do not coerce are skipped and contribute
/// nothing. With `allow_negative == false` the result is clamped at `0.0`;
/// otherwise the signed remainder is returned so export periods show up as
/// negative values.
///
/// # Arguments
///
/// * `main` - Whole-circuit reading
/// * `parts` - Known sub-readings subtracted from `main`
/// * `allow_negative` - Whether the remainder may drop below zero
///
/// # Examples
///
/// ```
/// use powermix::calc::aggregate::aggregate;
/// use powermix::calc::coerce::NumberLike;
///
/// let parts = [NumberLike::from(25.0), NumberLike::from("25")];
/// assert_eq!(aggregate(&NumberLike::from(100.0), &parts, false), Some(50.0));
/// ```
pub fn aggregate(main: &NumberLike, parts: &[NumberLike], allow_negative: bool) -> Option<f64> {
    let main_value = coerce(main)?;
    let parts_sum: f64 = parts.iter().filter_map(coerce).sum();
    Some(apply_policy(main_value - parts_sum, allow_negative))
}

/// Rounds once, then clamps at zero unless negatives are allowed.
///
/// A NaN remainder (e.g. `inf - inf`) clamps to `0.0` as well.
fn apply_policy(remainder: f64, allow_negative: bool) -> f64 {
    let rounded = round_to_precision(remainder);
    if allow_negative {
        rounded
    } else if rounded > 0.0 {
        rounded
    } else {
        0.0
    }
}

/// Rounds to [`ROUND_DECIMALS`] places using the exact decimal expansion of
/// the value, so `0.1 + 0.2 - 0.3` style residue never leaks into outputs.
pub fn round_to_precision(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.prec$}", prec = ROUND_DECIMALS)
        .parse()
        .unwrap_or(value)
}
