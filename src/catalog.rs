use crate::fallback::fallback_birds;
use crate::record::{Bird, NewBird};
use crate::seed;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::Path;

/// Canonical set of bird records.
///
/// Ids come from a counter that only ever moves forward, so iterating the map
/// yields birds in creation order.
#[derive(Debug)]
pub struct CatalogStore {
    birds: BTreeMap<u64, Bird>,
    next_id: u64,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            birds: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn from_birds(birds: impl IntoIterator<Item = NewBird>) -> Self {
        let mut store = Self::new();
        for bird in birds {
            store.create_bird(bird);
        }
        store
    }

    /// Seed from a tabular file, or from the built-in birds when no file is
    /// configured or the file cannot be used.
    pub fn seeded(seed_path: Option<&Path>) -> Self {
        let birds = match seed_path {
            Some(path) => match seed::read_birds(path) {
                Ok(birds) => birds,
                Err(e) => {
                    warn!(
                        "Could not seed catalog from {}: {}; using fallback birds",
                        path.display(),
                        e
                    );
                    fallback_birds()
                }
            },
            None => {
                info!("No seed file configured, using fallback birds");
                fallback_birds()
            }
        };

        let store = Self::from_birds(birds);
        if store.is_empty() {
            warn!("Catalog seeded with no birds");
        } else {
            info!("Catalog seeded with {} birds", store.len());
        }
        store
    }

    /// Names are expected to be non-empty. A bird without one is still
    /// stored so ids stay dense, but the gap is logged.
    pub fn create_bird(&mut self, new: NewBird) -> Bird {
        if new.name.trim().is_empty() || new.scientific_name.trim().is_empty() {
            warn!(
                "Creating bird with an empty name: {:?} ({:?})",
                new.name, new.scientific_name
            );
        }

        let id = self.next_id;
        self.next_id += 1;

        let bird = Bird {
            id,
            name: new.name,
            scientific_name: new.scientific_name,
            family: new.family,
            habitat: new.habitat,
            diet: new.diet,
            conservation_status: new.conservation_status,
            description: new.description,
            wikipedia_url: new.wikipedia_url,
            image_url: new.image_url,
            category: new.category.unwrap_or_default(),
        };
        self.birds.insert(id, bird.clone());
        bird
    }

    pub fn get_bird(&self, id: u64) -> Option<&Bird> {
        self.birds.get(&id)
    }

    pub fn all_birds(&self) -> impl Iterator<Item = &Bird> + '_ {
        self.birds.values()
    }

    pub fn len(&self) -> usize {
        self.birds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.birds.is_empty()
    }
}
