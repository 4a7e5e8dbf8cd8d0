//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects names that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a drop rate is a probability in `[0, 1]`.
///
/// # Examples
///
/// ```ignore
/// validate_drop_rate(0.5)  // Ok
/// validate_drop_rate(1.2)  // Err - above one
/// validate_drop_rate(f64::NAN) // Err - not a number
/// ```
pub fn validate_drop_rate(rate: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&rate) {
        let mut err = ValidationError::new("drop_rate_range");
        err.message = Some(format!("Drop rate must be between 0 and 1 (got {rate})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Fireball").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_drop_rate_bounds() {
        assert!(validate_drop_rate(0.0).is_ok());
        assert!(validate_drop_rate(0.5).is_ok());
        assert!(validate_drop_rate(1.0).is_ok());
    }

    #[test]
    fn test_validate_drop_rate_out_of_range() {
        assert!(validate_drop_rate(-0.1).is_err());
        assert!(validate_drop_rate(1.01).is_err());
        assert!(validate_drop_rate(f64::NAN).is_err()); // NaN is never in range
    }
}
