/// Xeno kernel — Argument Decoding
///
/// Positional, typed access to a call's JSON arguments. Every accessor
/// reports a `BadArguments` error naming the function and position.

use serde_json::Value;

use crate::domain::Principal;
use crate::error::ContractError;

pub struct Args<'a> {
    function: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(function: &'a str, values: &'a [Value]) -> Self {
        Self { function, values }
    }

    fn bad(&self, reason: String) -> ContractError {
        ContractError::BadArguments {
            function: self.function.to_string(),
            reason,
        }
    }

    /// Require exactly `n` arguments.
    pub fn expect_len(&self, n: usize) -> Result<(), ContractError> {
        if self.values.len() != n {
            return Err(self.bad(format!(
                "expected {} argument(s), got {}",
                n,
                self.values.len()
            )));
        }
        Ok(())
    }

    fn at(&self, index: usize) -> Result<&'a Value, ContractError> {
        self.values
            .get(index)
            .ok_or_else(|| self.bad(format!("missing argument {}", index)))
    }

    pub fn uint(&self, index: usize) -> Result<u64, ContractError> {
        self.at(index)?
            .as_u64()
            .ok_or_else(|| self.bad(format!("argument {} must be an unsigned integer", index)))
    }

    pub fn text(&self, index: usize) -> Result<&'a str, ContractError> {
        self.at(index)?
            .as_str()
            .ok_or_else(|| self.bad(format!("argument {} must be a string", index)))
    }

    pub fn principal(&self, index: usize) -> Result<Principal, ContractError> {
        Principal::parse(self.text(index)?)
    }

    /// Principal lookup key for reads. A string that is not a valid
    /// principal cannot name any record, so it yields `None`.
    pub fn lookup_principal(&self, index: usize) -> Result<Option<Principal>, ContractError> {
        Ok(Principal::parse(self.text(index)?).ok())
    }
}
