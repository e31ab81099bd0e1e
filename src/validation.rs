use crate::error::{Result, Error};

pub const SENTIMENT_MIN: f64 = 0.0;
pub const SENTIMENT_MAX: f64 = 100.0;

pub fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() {
        return Err(Error::ValidationError(format!("Price is not finite: {}", price)));
    }
    if price <= 0.0 {
        return Err(Error::ValidationError(format!("Price must be positive: {}", price)));
    }
    Ok(())
}

/// Checks a sentiment reading and returns it rounded to the nearest integer.
pub fn validate_sentiment(value: f64) -> Result<u8> {
    if !value.is_finite() {
        return Err(Error::ValidationError(format!("Sentiment is not finite: {}", value)));
    }
    if !(SENTIMENT_MIN..=SENTIMENT_MAX).contains(&value) {
        return Err(Error::ValidationError(format!(
            "Sentiment {} outside [{}, {}]",
            value, SENTIMENT_MIN, SENTIMENT_MAX
        )));
    }
    Ok(value.round() as u8)
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::ValidationError(format!("Amount is not finite: {}", amount)));
    }
    if amount < 0.0 {
        return Err(Error::ValidationError(format!("Amount cannot be negative: {}", amount)));
    }
    Ok(())
}

pub fn validate_trade_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::ValidationError("Trade id cannot be empty".to_string()));
    }
    Ok(())
}
