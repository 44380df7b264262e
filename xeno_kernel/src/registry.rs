/// Xeno kernel — telescope-integration Registry
///
/// Append-only catalogue of telescopes plus a per-telescope time-indexed
/// data log. Registration is open to any caller.

use std::collections::BTreeMap;

use crate::arithmetic::{next_id, require_len};
use crate::domain::{RegistryState, Telescope, TelescopeData};
use crate::error::{ContractError, Entity};

impl RegistryState {
    /// Register a telescope and return its id (1, 2, 3, ...).
    pub fn register_telescope(
        &mut self,
        name: &str,
        location: &str,
        api_endpoint: &str,
    ) -> Result<u64, ContractError> {
        let id = next_id(self.last_telescope_id)?;
        self.telescopes.insert(
            id,
            Telescope {
                name: name.to_string(),
                location: location.to_string(),
                api_endpoint: api_endpoint.to_string(),
            },
        );
        self.last_telescope_id = id;
        Ok(id)
    }

    /// Record `data` for `telescope_id` at `timestamp`.
    ///
    /// Returns true when an earlier payload at the same timestamp was
    /// replaced (last write wins).
    pub fn submit_data(
        &mut self,
        telescope_id: u64,
        timestamp: u64,
        data: &str,
    ) -> Result<bool, ContractError> {
        if !self.telescopes.contains_key(&telescope_id) {
            return Err(ContractError::NotFound(Entity::Telescope));
        }
        require_len("telescope data", data, self.max_payload_bytes)?;

        let previous = self
            .data
            .entry(telescope_id)
            .or_insert_with(BTreeMap::new)
            .insert(
                timestamp,
                TelescopeData {
                    data: data.to_string(),
                },
            );
        Ok(previous.is_some())
    }

    pub fn telescope(&self, id: u64) -> Option<&Telescope> {
        self.telescopes.get(&id)
    }

    pub fn data_at(&self, telescope_id: u64, timestamp: u64) -> Option<&TelescopeData> {
        self.data.get(&telescope_id)?.get(&timestamp)
    }

    pub fn telescope_count(&self) -> u64 {
        self.telescopes.len() as u64
    }

    /// Total number of recorded payloads across all telescopes.
    pub fn data_point_count(&self) -> u64 {
        self.data.values().map(|log| log.len() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RegistryState {
        RegistryState {
            last_telescope_id: 0,
            telescopes: BTreeMap::new(),
            data: BTreeMap::new(),
            max_payload_bytes: 64,
        }
    }

    #[test]
    fn test_ids_are_sequential_from_one() {
        let mut r = registry();
        let a = r
            .register_telescope("SETI ATA", "Hat Creek Radio Observatory, California", "https://api.seti.org/ata")
            .unwrap();
        let b = r.register_telescope("FAST", "Guizhou", "https://fast.example").unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(r.telescope(1).unwrap().name, "SETI ATA");
        assert!(r.telescope(3).is_none());
    }

    #[test]
    fn test_submit_to_unknown_telescope_writes_nothing() {
        let mut r = registry();
        assert_eq!(
            r.submit_data(999, 10, "Invalid data"),
            Err(ContractError::NotFound(Entity::Telescope))
        );
        assert!(r.data.is_empty());
    }

    #[test]
    fn test_submit_then_read_back() {
        let mut r = registry();
        let id = r.register_telescope("SETI ATA", "Hat Creek", "https://api.seti.org/ata").unwrap();
        assert_eq!(r.submit_data(id, 1234567890, "Raw signal data: 101010101010"), Ok(false));
        assert_eq!(
            r.data_at(id, 1234567890).map(|d| d.data.as_str()),
            Some("Raw signal data: 101010101010")
        );
        assert!(r.data_at(id, 9999999999).is_none());
    }

    #[test]
    fn test_same_timestamp_last_write_wins() {
        let mut r = registry();
        let id = r.register_telescope("A", "B", "C").unwrap();
        r.submit_data(id, 5, "first").unwrap();
        assert_eq!(r.submit_data(id, 5, "second"), Ok(true));
        assert_eq!(r.data_at(id, 5).unwrap().data, "second");
        assert_eq!(r.data_point_count(), 1);
    }

    #[test]
    fn test_payload_bound() {
        let mut r = registry();
        let id = r.register_telescope("A", "B", "C").unwrap();
        let big = "x".repeat(65);
        assert!(matches!(
            r.submit_data(id, 1, &big),
            Err(ContractError::TooLong { len: 65, max: 64, .. })
        ));
        assert_eq!(r.data_point_count(), 0);
    }
}
