//! Resolver for name-keyed reference tables.
//!
//! Job groups, job types, and products all resolve the same way: a bare name
//! is the natural key, and one resolver instance per table carries the right
//! pair of store operations.

use std::collections::HashMap;

use ciboard_core::NamedRow;
use tracing::{debug, warn};

use crate::store::{Arg, ParamRow, RefDataStore, StoreError, StoreOp};

use super::pending::PendingSet;

pub struct NameResolver {
    label: &'static str,
    create_op: StoreOp,
    fetch_op: StoreOp,
    pending: PendingSet<String, String>,
}

impl NameResolver {
    pub fn new(label: &'static str, create_op: StoreOp, fetch_op: StoreOp) -> Self {
        Self {
            label,
            create_op,
            fetch_op,
            pending: PendingSet::new(),
        }
    }

    /// Buffer a name for resolution. Repeats within a cycle collapse.
    pub fn add(&mut self, name: &str) {
        self.pending.insert(name.to_string(), name.to_string());
    }

    /// Create-then-fetch every buffered name, returning rows keyed by name.
    /// The buffer survives the flush; callers clear it through `reset` once
    /// the whole cycle has landed.
    pub fn flush_all(
        &self,
        store: &dyn RefDataStore,
    ) -> Result<HashMap<String, NamedRow>, StoreError> {
        if self.pending.is_empty() {
            return Ok(HashMap::new());
        }

        let create_rows: Vec<ParamRow> = self
            .pending
            .rows()
            .iter()
            .map(|name| vec![Arg::Text(name.clone())])
            .collect();
        let created = store.bulk_create_or_ignore(self.create_op, &create_rows)?;

        let values: Vec<Arg> = self
            .pending
            .rows()
            .iter()
            .map(|name| Arg::Text(name.clone()))
            .collect();
        let fetched = store.fetch_by_in_list(self.fetch_op, &values, "name")?;
        if fetched.len() != self.pending.len() {
            // Every submitted name was just created or already present, so a
            // shortfall means the backend lost rows between the two calls.
            warn!(
                "{}: submitted {} names, resolved {}",
                self.label,
                self.pending.len(),
                fetched.len()
            );
        }
        debug!(
            "{}: resolved {} names ({} new)",
            self.label,
            fetched.len(),
            created
        );

        let mut resolved = HashMap::new();
        for (name, row) in fetched {
            resolved.insert(name.clone(), NamedRow { id: row.id, name });
        }
        Ok(resolved)
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
