use crate::core::particle::ParticleData;
use std::collections::BTreeMap;

/// The live particle collection of one simulated event.
///
/// Ids are assigned on insertion and never reused, so a stored id names one
/// insertion for the lifetime of the collection; an action holding stale ids
/// simply finds them absent. Iteration runs in id order, which keeps
/// downstream consumers deterministic.
#[derive(Debug, Default)]
pub struct Particles {
    map: BTreeMap<u64, ParticleData>,
    next_id: u64,
}

impl Particles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a particle, assign it the next fresh id and return that id.
    pub fn insert(&mut self, mut data: ParticleData) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        data.set_id(id);
        self.map.insert(id, data);
        id
    }

    /// Remove and return the particle with the given id, if present.
    pub fn remove(&mut self, id: u64) -> Option<ParticleData> {
        self.map.remove(&id)
    }

    /// Whether a particle with this id is currently in the collection.
    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        self.map.contains_key(&id)
    }

    /// The particle with the given id, if present.
    #[inline]
    pub fn get(&self, id: u64) -> Option<&ParticleData> {
        self.map.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over the particles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ParticleData> {
        self.map.values()
    }
}
