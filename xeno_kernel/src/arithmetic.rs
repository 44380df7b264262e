/// Xeno kernel — Arithmetic Primitives
///
/// All amounts and ids are u64. No float. Every operation is checked and
/// reports overflow as a contract error instead of wrapping.

use crate::error::ContractError;

/// Checked addition. `Overflow` on u64 overflow.
pub fn checked_add(a: u64, b: u64) -> Result<u64, ContractError> {
    a.checked_add(b).ok_or(ContractError::Overflow)
}

/// Checked subtraction. `Overflow` on underflow.
pub fn checked_sub(a: u64, b: u64) -> Result<u64, ContractError> {
    a.checked_sub(b).ok_or(ContractError::Overflow)
}

/// Next id for a monotonic counter whose last issued value is `last`.
pub fn next_id(last: u64) -> Result<u64, ContractError> {
    checked_add(last, 1)
}

/// Reject zero amounts.
pub fn require_positive(amount: u64) -> Result<u64, ContractError> {
    if amount == 0 {
        return Err(ContractError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// Reject strings longer than `max` bytes.
pub fn require_len(field: &'static str, value: &str, max: u64) -> Result<(), ContractError> {
    let len = value.len() as u64;
    if len > max {
        return Err(ContractError::TooLong { field, len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add_ok() {
        assert_eq!(checked_add(3, 4), Ok(7));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(checked_add(u64::MAX, 1), Err(ContractError::Overflow));
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(checked_sub(1, 2), Err(ContractError::Overflow));
        assert_eq!(checked_sub(5, 2), Ok(3));
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(0), Ok(1));
        assert_eq!(next_id(u64::MAX), Err(ContractError::Overflow));
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive(1), Ok(1));
        assert_eq!(require_positive(0), Err(ContractError::InvalidAmount(0)));
    }

    #[test]
    fn test_require_len() {
        assert!(require_len("data", "abcd", 4).is_ok());
        assert_eq!(
            require_len("data", "abcde", 4),
            Err(ContractError::TooLong {
                field: "data",
                len: 5,
                max: 4
            })
        );
    }
}
