use crate::record::Sighting;
use log::{debug, warn};
use std::collections::HashMap;

/// Which user has seen which bird.
///
/// Lookups are linear scans over every sighting; at most one record per
/// (user, bird) pair is kept by `add_sighting`.
#[derive(Debug)]
pub struct SightingStore {
    sightings: HashMap<u64, Sighting>,
    next_id: u64,
}

impl Default for SightingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SightingStore {
    pub fn new() -> Self {
        Self {
            sightings: HashMap::new(),
            next_id: 1,
        }
    }

    /// Returns the existing sighting for the pair, or records a new one.
    pub fn add_sighting(&mut self, user_id: u64, bird_id: u64) -> Sighting {
        if let Some(existing) = self
            .sightings
            .values()
            .find(|s| s.user_id == user_id && s.bird_id == bird_id)
        {
            debug!("User {} already saw bird {}", user_id, bird_id);
            return *existing;
        }

        let id = self.next_id;
        self.next_id += 1;

        let sighting = Sighting {
            id,
            user_id,
            bird_id,
        };
        self.sightings.insert(id, sighting);
        sighting
    }

    /// Removes every sighting for the pair. Removing nothing still succeeds.
    pub fn remove_sighting(&mut self, user_id: u64, bird_id: u64) -> bool {
        let before = self.sightings.len();
        self.sightings
            .retain(|_, s| !(s.user_id == user_id && s.bird_id == bird_id));

        let removed = before - self.sightings.len();
        if removed > 1 {
            warn!(
                "Removed {} duplicate sightings of bird {} for user {}",
                removed, bird_id, user_id
            );
        }
        true
    }

    pub fn list_sightings(&self, user_id: u64) -> Vec<Sighting> {
        self.sightings
            .values()
            .filter(|s| s.user_id == user_id)
            .copied()
            .collect()
    }

    #[cfg(test)]
    fn insert_raw(&mut self, sighting: Sighting) {
        self.next_id = self.next_id.max(sighting.id + 1);
        self.sightings.insert(sighting.id, sighting);
    }
}
