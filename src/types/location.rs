use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable, provider-independent location id used in recurring booking configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u32);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-local location key. Some backends number their branches, others use opaque slugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationKey {
    Numeric(i64),
    Opaque(String),
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKey::Numeric(n) => write!(f, "{n}"),
            LocationKey::Opaque(s) => f.write_str(s),
        }
    }
}

impl From<i64> for LocationKey {
    fn from(value: i64) -> Self {
        LocationKey::Numeric(value)
    }
}

impl From<&str> for LocationKey {
    fn from(value: &str) -> Self {
        LocationKey::Opaque(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub key: LocationKey,
    pub name: String,
}

impl Location {
    pub fn new(id: u32, key: impl Into<LocationKey>, name: impl Into<String>) -> Self {
        Self {
            id: LocationId(id),
            key: key.into(),
            name: name.into(),
        }
    }
}

/// Immutable bidirectional mapping between stable location ids and provider-local keys.
///
/// Built once per chain from static branch definitions (plus config overrides). When two
/// entries share an id or key, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    locations: Vec<Location>,
    by_id: HashMap<LocationId, usize>,
    by_key: HashMap<LocationKey, usize>,
}

impl LocationTable {
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        let mut table = Self::default();
        for location in locations {
            table.insert(location);
        }
        table
    }

    fn insert(&mut self, location: Location) {
        if let Some(&idx) = self.by_id.get(&location.id) {
            let old = std::mem::replace(&mut self.locations[idx], location);
            self.by_key.remove(&old.key);
            self.by_key.insert(self.locations[idx].key.clone(), idx);
            return;
        }
        let idx = self.locations.len();
        self.by_id.insert(location.id, idx);
        self.by_key.insert(location.key.clone(), idx);
        self.locations.push(location);
    }

    /// Stable id -> provider-local key.
    pub fn key(&self, id: LocationId) -> Option<&LocationKey> {
        self.by_id.get(&id).map(|&idx| &self.locations[idx].key)
    }

    /// Provider-local key -> stable id.
    pub fn id(&self, key: &LocationKey) -> Option<LocationId> {
        self.by_key.get(key).map(|&idx| self.locations[idx].id)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.by_id.get(&id).map(|&idx| &self.locations[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
