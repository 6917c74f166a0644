use num_bigint::BigInt;

/// Price of a linear Dutch auction at `t`.
///
/// Returns `start_price` up to `start_time`, `base_price` from `end_time` on, and
/// interpolates (rounding the decay down) in between.
pub fn linear_price(
    t: i64,
    start_time: i64,
    end_time: i64,
    start_price: &BigInt,
    base_price: &BigInt,
) -> BigInt {
    if t >= end_time {
        return base_price.clone();
    }
    if t <= start_time {
        return start_price.clone();
    }
    let elapsed = BigInt::from(t - start_time);
    let duration = BigInt::from(end_time - start_time);
    start_price - (start_price - base_price) * elapsed / duration
}
