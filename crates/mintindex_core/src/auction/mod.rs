//! Closed-form Dutch-auction price estimators.
//!
//! # Responsibility
//! - Reproduce on-chain linear and exponential price curves with integer math.
//! - Estimate when an exponential auction reaches its base price.
//!
//! # Invariants
//! - No floating point; prices are `BigInt`, times are unix seconds.
//! - Every curve is monotonically non-increasing and floored at base price.

mod exponential;
mod linear;

pub use exponential::{exponential_duration_to_base_price, exponential_price};
pub use linear::linear_price;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invalid auction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionMathError {
    NonPositiveHalfLife(i64),
    NonPositiveBasePrice,
    DurationOverflow,
}

impl Display for AuctionMathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveHalfLife(value) => {
                write!(f, "half-life must be positive, got {value}")
            }
            Self::NonPositiveBasePrice => write!(f, "exponential base price must be positive"),
            Self::DurationOverflow => write!(f, "auction duration does not fit in i64 seconds"),
        }
    }
}

impl Error for AuctionMathError {}
