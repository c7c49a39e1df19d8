use crate::catalog::CatalogStore;
use crate::record::{Bird, BirdWithSeenStatus, Sighting};
use crate::sightings::SightingStore;
use std::collections::HashSet;

/// Joins the catalog with one user's sightings.
#[derive(Debug, Default)]
pub struct CatalogService {
    catalog: CatalogStore,
    sightings: SightingStore,
}

impl CatalogService {
    pub fn new(catalog: CatalogStore, sightings: SightingStore) -> Self {
        Self { catalog, sightings }
    }

    /// Every bird, annotated for `user_id`. Without a user nothing is seen.
    /// Always computed from the stores, never cached.
    pub fn birds_with_seen_status(&self, user_id: Option<u64>) -> Vec<BirdWithSeenStatus> {
        let seen: HashSet<u64> = match user_id {
            Some(user_id) => self
                .sightings
                .list_sightings(user_id)
                .iter()
                .map(|s| s.bird_id)
                .collect(),
            None => HashSet::new(),
        };

        self.catalog
            .all_birds()
            .map(|bird| BirdWithSeenStatus {
                bird: bird.clone(),
                seen: seen.contains(&bird.id),
            })
            .collect()
    }

    pub fn bird(&self, id: u64) -> Option<Bird> {
        self.catalog.get_bird(id).cloned()
    }

    pub fn mark_seen(&mut self, user_id: u64, bird_id: u64) -> Sighting {
        self.sightings.add_sighting(user_id, bird_id)
    }

    pub fn mark_unseen(&mut self, user_id: u64, bird_id: u64) -> bool {
        self.sightings.remove_sighting(user_id, bird_id)
    }

    pub fn sightings_for(&self, user_id: u64) -> Vec<Sighting> {
        self.sightings.list_sightings(user_id)
    }

    pub fn bird_count(&self) -> usize {
        self.catalog.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_birds;

    fn five_bird_service() -> CatalogService {
        let catalog = CatalogStore::from_birds(fallback_birds());
        assert_eq!(catalog.len(), 5);
        CatalogService::new(catalog, SightingStore::new())
    }

    fn seen_ids(service: &CatalogService, user_id: Option<u64>) -> Vec<u64> {
        service
            .birds_with_seen_status(user_id)
            .iter()
            .filter(|b| b.seen)
            .map(|b| b.bird.id)
            .collect()
    }

    #[test]
    fn test_mark_seen_scenario() {
        let mut service = five_bird_service();

        service.mark_seen(1, 3);
        let birds = service.birds_with_seen_status(Some(1));
        assert_eq!(birds.len(), 5);
        assert_eq!(seen_ids(&service, Some(1)), vec![3]);

        service.mark_unseen(1, 3);
        assert!(seen_ids(&service, Some(1)).is_empty());
    }

    #[test]
    fn test_anonymous_viewer_sees_nothing() {
        let mut service = five_bird_service();
        service.mark_seen(1, 1);
        service.mark_seen(2, 2);

        let birds = service.birds_with_seen_status(None);
        assert_eq!(birds.len(), 5);
        assert!(birds.iter().all(|b| !b.seen));
    }

    #[test]
    fn test_round_trip_restores_view() {
        let mut service = five_bird_service();
        service.mark_seen(1, 2);
        let before = service.birds_with_seen_status(Some(1));

        service.mark_seen(1, 4);
        service.mark_unseen(1, 4);

        assert_eq!(service.birds_with_seen_status(Some(1)), before);
    }

    #[test]
    fn test_double_toggle_leaves_no_sighting() {
        let mut service = five_bird_service();
        service.mark_seen(1, 3);
        service.mark_unseen(1, 3);

        assert!(
            service
                .sightings_for(1)
                .iter()
                .all(|s| s.bird_id != 3)
        );
    }

    #[test]
    fn test_users_are_independent() {
        let mut service = five_bird_service();
        service.mark_seen(1, 5);
        service.mark_seen(2, 1);

        assert_eq!(seen_ids(&service, Some(1)), vec![5]);
        assert_eq!(seen_ids(&service, Some(2)), vec![1]);
    }

    #[test]
    fn test_bird_lookup() {
        let service = five_bird_service();
        assert_eq!(service.bird(2).map(|b| b.name), Some("Blue Jay".to_string()));
        assert!(service.bird(999).is_none());
        assert_eq!(service.bird_count(), 5);
    }
}
