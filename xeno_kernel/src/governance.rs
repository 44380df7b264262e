/// Xeno kernel — xenolinguistic-protocol Governance
///
/// Protocol lifecycle: created `active`, voted on while active, moved to a
/// terminal status (`closed` | `rejected`) by its creator. One vote per
/// principal per protocol, tracked by contributor records.

use std::collections::BTreeMap;

use crate::arithmetic::{checked_add, next_id};
use crate::domain::{
    Contributor, GovernanceState, Principal, Protocol, ProtocolStatus, UpdatePolicy,
};
use crate::error::{ContractError, Entity};

impl GovernanceState {
    fn existing(&self, id: u64) -> Result<&Protocol, ContractError> {
        self.protocols
            .get(&id)
            .ok_or(ContractError::NotFound(Entity::Protocol))
    }

    pub fn create_protocol(
        &mut self,
        creator: &Principal,
        name: &str,
        description: &str,
        content: &str,
    ) -> Result<u64, ContractError> {
        let id = next_id(self.last_protocol_id)?;
        self.protocols.insert(
            id,
            Protocol {
                creator: creator.clone(),
                name: name.to_string(),
                description: description.to_string(),
                content: content.to_string(),
                status: ProtocolStatus::Active,
                votes: 0,
            },
        );
        self.last_protocol_id = id;
        Ok(id)
    }

    /// Replace the content of protocol `id`. Status and votes are kept.
    pub fn update_protocol(
        &mut self,
        caller: &Principal,
        id: u64,
        content: &str,
    ) -> Result<(), ContractError> {
        let protocol = self.existing(id)?;
        if self.update_policy == UpdatePolicy::CreatorOnly && &protocol.creator != caller {
            return Err(ContractError::Unauthorized);
        }

        if let Some(protocol) = self.protocols.get_mut(&id) {
            protocol.content = content.to_string();
        }
        Ok(())
    }

    /// Cast `voter`'s single vote on protocol `id`. Returns the new tally.
    pub fn vote(&mut self, voter: &Principal, id: u64) -> Result<u64, ContractError> {
        let protocol = self.existing(id)?;
        if protocol.status != ProtocolStatus::Active {
            return Err(ContractError::NotActive);
        }
        if self.contributor(id, voter).is_some_and(|c| c.contributed) {
            return Err(ContractError::AlreadyVoted);
        }
        let votes = checked_add(protocol.votes, 1)?;

        if let Some(protocol) = self.protocols.get_mut(&id) {
            protocol.votes = votes;
        }
        self.contributors
            .entry(id)
            .or_insert_with(BTreeMap::new)
            .insert(voter.clone(), Contributor { contributed: true });
        Ok(votes)
    }

    /// Creator-only move from `active` to a terminal status.
    pub fn set_status(
        &mut self,
        caller: &Principal,
        id: u64,
        status: ProtocolStatus,
    ) -> Result<(), ContractError> {
        let protocol = self.existing(id)?;
        if &protocol.creator != caller {
            return Err(ContractError::Unauthorized);
        }
        if protocol.status != ProtocolStatus::Active {
            return Err(ContractError::NotActive);
        }
        if status == ProtocolStatus::Active {
            return Err(ContractError::InvalidStatus(status.as_str().to_string()));
        }

        if let Some(protocol) = self.protocols.get_mut(&id) {
            protocol.status = status;
        }
        Ok(())
    }

    pub fn protocol(&self, id: u64) -> Option<&Protocol> {
        self.protocols.get(&id)
    }

    pub fn contributor(&self, id: u64, principal: &Principal) -> Option<&Contributor> {
        self.contributors.get(&id)?.get(principal)
    }

    pub fn protocol_count(&self) -> u64 {
        self.protocols.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Principal {
        Principal::parse(s).unwrap()
    }

    fn governance(update_policy: UpdatePolicy) -> GovernanceState {
        GovernanceState {
            last_protocol_id: 0,
            protocols: BTreeMap::new(),
            contributors: BTreeMap::new(),
            update_policy,
        }
    }

    fn greeting(g: &mut GovernanceState, creator: &Principal) -> u64 {
        g.create_protocol(
            creator,
            "Universal Greeting Protocol",
            "A protocol for initial contact with extraterrestrial intelligence",
            "Step 1: Transmit prime numbers...",
        )
        .unwrap()
    }

    #[test]
    fn test_create_starts_active_with_zero_votes() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        let creator = p("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM");
        let id = greeting(&mut g, &creator);
        assert_eq!(id, 1);
        let proto = g.protocol(id).unwrap();
        assert_eq!(proto.status, ProtocolStatus::Active);
        assert_eq!(proto.votes, 0);
        assert_eq!(proto.creator, creator);
        assert_eq!(proto.content, "Step 1: Transmit prime numbers...");
    }

    #[test]
    fn test_update_keeps_status_and_votes() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        let creator = p("ST1CREATOR");
        let id = greeting(&mut g, &creator);
        g.vote(&p("ST1VOTER"), id).unwrap();
        g.update_protocol(&creator, id, "Updated: Step 1: Transmit fibonacci sequence...")
            .unwrap();
        let proto = g.protocol(id).unwrap();
        assert_eq!(proto.content, "Updated: Step 1: Transmit fibonacci sequence...");
        assert_eq!(proto.votes, 1);
        assert_eq!(proto.status, ProtocolStatus::Active);
    }

    #[test]
    fn test_update_unknown_protocol() {
        let mut g = governance(UpdatePolicy::AnyCaller);
        assert_eq!(
            g.update_protocol(&p("ST1ANY"), 999, "Invalid update"),
            Err(ContractError::NotFound(Entity::Protocol))
        );
    }

    #[test]
    fn test_update_policy() {
        let mut strict = governance(UpdatePolicy::CreatorOnly);
        let id = greeting(&mut strict, &p("ST1CREATOR"));
        assert_eq!(
            strict.update_protocol(&p("ST1OTHER"), id, "x"),
            Err(ContractError::Unauthorized)
        );

        let mut open = governance(UpdatePolicy::AnyCaller);
        let id = greeting(&mut open, &p("ST1CREATOR"));
        open.update_protocol(&p("ST1OTHER"), id, "x").unwrap();
        assert_eq!(open.protocol(id).unwrap().content, "x");
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        let id = greeting(&mut g, &p("ST1CREATOR"));
        let voter = p("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM");
        assert_eq!(g.vote(&voter, id), Ok(1));
        assert_eq!(g.contributor(id, &voter), Some(&Contributor { contributed: true }));
        assert_eq!(g.vote(&voter, id), Err(ContractError::AlreadyVoted));
        assert_eq!(g.protocol(id).unwrap().votes, 1);
        assert!(g.contributor(id, &p("ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG")).is_none());
    }

    #[test]
    fn test_vote_on_closed_protocol_is_not_active() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        let creator = p("ST1CREATOR");
        let voter = p("ST1VOTER");
        let id = greeting(&mut g, &creator);
        g.vote(&voter, id).unwrap();
        g.set_status(&creator, id, ProtocolStatus::Closed).unwrap();

        // NotActive wins over AlreadyVoted.
        assert_eq!(g.vote(&voter, id), Err(ContractError::NotActive));
        assert_eq!(g.vote(&p("ST1FRESH"), id), Err(ContractError::NotActive));
        assert_eq!(g.protocol(id).unwrap().votes, 1);
    }

    #[test]
    fn test_vote_unknown_protocol() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        assert_eq!(
            g.vote(&p("ST1VOTER"), 2),
            Err(ContractError::NotFound(Entity::Protocol))
        );
        assert!(g.contributors.is_empty());
    }

    #[test]
    fn test_set_status_rules() {
        let mut g = governance(UpdatePolicy::CreatorOnly);
        let creator = p("ST1CREATOR");
        let id = greeting(&mut g, &creator);
        assert_eq!(
            g.set_status(&p("ST1OTHER"), id, ProtocolStatus::Rejected),
            Err(ContractError::Unauthorized)
        );
        assert_eq!(
            g.set_status(&creator, id, ProtocolStatus::Active),
            Err(ContractError::InvalidStatus("active".into()))
        );
        g.set_status(&creator, id, ProtocolStatus::Rejected).unwrap();
        assert_eq!(
            g.set_status(&creator, id, ProtocolStatus::Closed),
            Err(ContractError::NotActive)
        );
        assert_eq!(g.protocol(id).unwrap().status, ProtocolStatus::Rejected);
    }
}
