use super::AuctionMathError;
use num_bigint::BigInt;

/// Seconds until an exponential auction reaches `base_price`.
///
/// The curve halves the price once per completed half-life and interpolates
/// linearly inside the current half-life, so with `k` whole halvings that stay
/// at or above `base_price` and `y = start_price >> k` the result is
/// `k * h + floor(2 * h * (y - base_price) / y)`.
pub fn exponential_duration_to_base_price(
    start_price: &BigInt,
    base_price: &BigInt,
    half_life_seconds: i64,
) -> Result<i64, AuctionMathError> {
    if half_life_seconds <= 0 {
        return Err(AuctionMathError::NonPositiveHalfLife(half_life_seconds));
    }
    let zero = BigInt::from(0);
    if *base_price <= zero {
        return Err(AuctionMathError::NonPositiveBasePrice);
    }
    if start_price <= base_price {
        return Ok(0);
    }

    let mut halvings: i64 = 0;
    let mut price = start_price.clone();
    while (&price >> 1usize) >= *base_price {
        price >>= 1usize;
        halvings += 1;
    }

    let half_life = BigInt::from(half_life_seconds);
    let partial = BigInt::from(2) * &half_life * (&price - base_price) / &price;
    let partial = i64::try_from(&partial).map_err(|_| AuctionMathError::DurationOverflow)?;

    halvings
        .checked_mul(half_life_seconds)
        .and_then(|whole| whole.checked_add(partial))
        .ok_or(AuctionMathError::DurationOverflow)
}

/// Price of an exponential Dutch auction at `t`.
///
/// Never below `base_price`; equal to it once `t` passes
/// `start_time + exponential_duration_to_base_price(..)`.
pub fn exponential_price(
    t: i64,
    start_time: i64,
    start_price: &BigInt,
    base_price: &BigInt,
    half_life_seconds: i64,
) -> Result<BigInt, AuctionMathError> {
    let duration =
        exponential_duration_to_base_price(start_price, base_price, half_life_seconds)?;
    if t <= start_time {
        return Ok(start_price.max(base_price).clone());
    }
    let elapsed = t - start_time;
    if elapsed >= duration {
        return Ok(base_price.clone());
    }

    let halvings = usize::try_from(elapsed / half_life_seconds)
        .map_err(|_| AuctionMathError::DurationOverflow)?;
    let remainder = BigInt::from(elapsed % half_life_seconds);
    let half_life = BigInt::from(half_life_seconds);

    let price = start_price >> halvings;
    let decay = &price * remainder / half_life / BigInt::from(2);
    Ok((price - decay).max(base_price.clone()))
}
