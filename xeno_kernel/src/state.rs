/// Xeno kernel — State Construction

use std::collections::BTreeMap;

use crate::arithmetic::require_len;
use crate::domain::{
    ChainState, GenesisConfig, GovernanceState, LedgerState, RegistryState, MAX_TOKEN_URI_LEN,
};
use crate::error::ContractError;

/// Create a fresh ChainState from a genesis configuration.
///
/// Every counter starts at zero, so the first telescope and the first
/// protocol both receive id 1.
pub fn create_initial_state(genesis: &GenesisConfig) -> Result<ChainState, ContractError> {
    require_len("token uri", &genesis.token_uri, MAX_TOKEN_URI_LEN)?;

    Ok(ChainState {
        ledger: LedgerState {
            owner: genesis.owner.clone(),
            token_uri: genesis.token_uri.clone(),
            total_supply: 0,
            balances: BTreeMap::new(),
        },
        registry: RegistryState {
            last_telescope_id: 0,
            telescopes: BTreeMap::new(),
            data: BTreeMap::new(),
            max_payload_bytes: genesis.max_payload_bytes,
        },
        governance: GovernanceState {
            last_protocol_id: 0,
            protocols: BTreeMap::new(),
            contributors: BTreeMap::new(),
            update_policy: genesis.update_policy,
        },
    })
}
