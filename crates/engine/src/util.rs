//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! normalization so every write path enforces the same rules.

use crate::{EngineError, Money, ResultEngine};

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Trim a required name, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Client-generated keys are opaque, but must be present and bounded.
pub(crate) fn normalize_idempotency_key(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(
            "idempotency_key must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(EngineError::Validation(format!(
            "idempotency_key must be at most {MAX_IDEMPOTENCY_KEY_LEN} bytes"
        )));
    }
    Ok(trimmed.to_string())
}

/// Donations and expenses may be zero, never negative.
pub(crate) fn ensure_entry_amount(amount: Money) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(
            "amount must be >= 0".to_string(),
        ));
    }
    ensure_below_max(amount)
}

pub(crate) fn ensure_transfer_amount(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "transfer amount must be > 0".to_string(),
        ));
    }
    ensure_below_max(amount)
}

fn ensure_below_max(amount: Money) -> ResultEngine<()> {
    if amount > Money::MAX_AMOUNT {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be at most {}",
            Money::MAX_AMOUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_is_trimmed_and_required() {
        assert_eq!(normalize_idempotency_key("  abc ").unwrap(), "abc");
        assert!(normalize_idempotency_key("   ").is_err());
        assert!(normalize_idempotency_key(&"x".repeat(129)).is_err());
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(
            normalize_optional_text(Some(" cash ")),
            Some("cash".to_string())
        );
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn amounts_are_bounded() {
        assert!(ensure_entry_amount(Money::new(-1)).is_err());
        assert!(ensure_entry_amount(Money::ZERO).is_ok());
        assert!(ensure_entry_amount(Money::MAX_AMOUNT).is_ok());
        assert!(ensure_entry_amount(Money::new(Money::MAX_AMOUNT.minor() + 1)).is_err());
        assert!(ensure_transfer_amount(Money::ZERO).is_err());
        assert!(ensure_transfer_amount(Money::new(i64::MAX)).is_err());
    }
}
