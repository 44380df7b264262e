/// Xeno kernel — xenotoken Ledger
///
/// Owner-gated minting, peer transfers between named accounts,
/// owner-writable token URI.
/// Every operation validates fully before touching `self`, so an `Err`
/// always leaves the ledger unchanged.

use crate::arithmetic::{checked_add, checked_sub, require_len, require_positive};
use crate::domain::{LedgerState, Principal, MAX_TOKEN_URI_LEN};
use crate::error::ContractError;

impl LedgerState {
    fn ensure_owner(&self, caller: &Principal) -> Result<(), ContractError> {
        if caller != &self.owner {
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }

    /// Balance of `account`, 0 if it has never been credited.
    pub fn balance_of(&self, account: &Principal) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Owner-only issuance of `amount` to `recipient`.
    pub fn mint(
        &mut self,
        caller: &Principal,
        amount: u64,
        recipient: &Principal,
    ) -> Result<(), ContractError> {
        self.ensure_owner(caller)?;
        self.issue(amount, recipient)
    }

    /// Second issuance channel, same ledger effect as `mint`.
    pub fn reward_breakthrough(
        &mut self,
        caller: &Principal,
        recipient: &Principal,
        amount: u64,
    ) -> Result<(), ContractError> {
        self.ensure_owner(caller)?;
        self.issue(amount, recipient)
    }

    fn issue(&mut self, amount: u64, recipient: &Principal) -> Result<(), ContractError> {
        require_positive(amount)?;
        let supply = checked_add(self.total_supply, amount)?;
        let balance = checked_add(self.balance_of(recipient), amount)?;

        self.total_supply = supply;
        self.balances.insert(recipient.clone(), balance);
        Ok(())
    }

    /// Move `amount` from `sender` to `recipient`. The sender is an
    /// argument; the caller is not consulted.
    pub fn transfer(
        &mut self,
        amount: u64,
        sender: &Principal,
        recipient: &Principal,
    ) -> Result<(), ContractError> {
        require_positive(amount)?;

        let available = self.balance_of(sender);
        if available < amount {
            return Err(ContractError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        if sender == recipient {
            return Ok(());
        }

        let debited = checked_sub(available, amount)?;
        let credited = checked_add(self.balance_of(recipient), amount)?;

        self.balances.insert(sender.clone(), debited);
        self.balances.insert(recipient.clone(), credited);
        Ok(())
    }

    pub fn set_token_uri(&mut self, caller: &Principal, uri: &str) -> Result<(), ContractError> {
        self.ensure_owner(caller)?;
        require_len("token uri", uri, MAX_TOKEN_URI_LEN)?;
        self.token_uri = uri.to_string();
        Ok(())
    }
}
