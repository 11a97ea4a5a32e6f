use rust_decimal::Decimal;
use validator::Validate;

use crate::error::{Error, Result};

pub fn validate<T: Validate>(val: &T) -> Result<()> {
    val.validate().map_err(Error::from)
}

pub const MAX_SCORE: Decimal = Decimal::TEN;

/// Interview scores live in `[0, 10]`.
pub fn validate_score(field: &str, score: Option<Decimal>) -> Result<()> {
    match score {
        Some(value) if value < Decimal::ZERO || value > MAX_SCORE => Err(Error::BadRequest(
            format!("{} score must be between 0 and {}, got {}", field, MAX_SCORE, value),
        )),
        _ => Ok(()),
    }
}
