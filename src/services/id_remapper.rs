use std::collections::HashMap;

use crate::domain::EntityKind;
use crate::errors::{PortabilityError, PortabilityResult};

/// Operation-scoped translation table from source-instance ids to
/// destination-instance ids, keyed per entity kind.
///
/// Entries are recorded exactly once, by successful persistence of the
/// corresponding entity, and are read-only afterwards. A lookup miss means
/// the archive references an entity it does not contain and is never
/// silently defaulted.
#[derive(Debug, Default)]
pub struct IdRemapper {
    map: HashMap<(EntityKind, i64), i64>,
}

impl IdRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EntityKind, source_id: i64, destination_id: i64) -> PortabilityResult<()> {
        if self.map.contains_key(&(kind, source_id)) {
            return Err(PortabilityError::Storage(format!(
                "duplicate id mapping recorded for {} {}",
                kind, source_id
            )));
        }
        self.map.insert((kind, source_id), destination_id);
        Ok(())
    }

    pub fn resolve(&self, kind: EntityKind, source_id: i64) -> PortabilityResult<i64> {
        self.map
            .get(&(kind, source_id))
            .copied()
            .ok_or(PortabilityError::ReferentialIntegrity { kind, source_id })
    }

    pub fn resolve_opt(&self, kind: EntityKind, source_id: Option<i64>) -> PortabilityResult<Option<i64>> {
        source_id.map(|id| self.resolve(kind, id)).transpose()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
