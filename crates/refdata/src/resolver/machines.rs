//! Resolver for machines, with heartbeat bookkeeping.
//!
//! Machines are the one reference table with mutable state: `first_seen` is
//! fixed by whichever create lands first and never moves, while `last_seen`
//! advances with every observation. The heartbeat goes through an explicit
//! update statement after the create-and-fetch pass, never through an upsert.

use std::collections::HashMap;

use ciboard_core::NamedRow;
use tracing::debug;

use crate::error::RefDataError;
use crate::store::{Arg, ParamRow, RefDataStore, StoreError, StoreOp};

use super::pending::PendingSet;

/// A machine fact waiting for resolution. Carries no id.
#[derive(Debug)]
struct MachineCandidate {
    name: String,
    first_seen: i64,
    last_seen: i64,
}

/// One observed heartbeat, applied after the create-and-fetch pass.
#[derive(Debug)]
struct HeartbeatUpdate {
    last_seen: i64,
    name: String,
}

pub struct MachineResolver {
    pending: PendingSet<String, MachineCandidate>,
    heartbeats: Vec<HeartbeatUpdate>,
}

impl MachineResolver {
    pub fn new() -> Self {
        Self {
            pending: PendingSet::new(),
            heartbeats: Vec::new(),
        }
    }

    /// Buffer a machine observation. Every accepted observation queues a
    /// heartbeat update; the first per name also queues the create row that
    /// fixes `first_seen`.
    pub fn add(&mut self, name: &str, timestamp: i64) -> Result<(), RefDataError> {
        if name.is_empty() {
            return Err(RefDataError::InvalidMachine {
                name: name.to_string(),
                timestamp,
                reason: "empty name",
            });
        }
        if timestamp < 0 {
            return Err(RefDataError::InvalidMachine {
                name: name.to_string(),
                timestamp,
                reason: "negative timestamp",
            });
        }

        self.heartbeats.push(HeartbeatUpdate {
            last_seen: timestamp,
            name: name.to_string(),
        });
        self.pending.insert(
            name.to_string(),
            MachineCandidate {
                name: name.to_string(),
                first_seen: timestamp,
                last_seen: timestamp,
            },
        );
        Ok(())
    }

    /// Create unseen machines, fetch ids for every buffered name, then apply
    /// the queued heartbeats in observation order.
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
            .map(|c| {
                vec![
                    Arg::Text(c.name.clone()),
                    Arg::Int(c.first_seen),
                    Arg::Int(c.last_seen),
                ]
            })
            .collect();
        let created = store.bulk_create_or_ignore(StoreOp::CreateMachine, &create_rows)?;

        let values: Vec<Arg> = self
            .pending
            .rows()
            .iter()
            .map(|c| Arg::Text(c.name.clone()))
            .collect();
        let fetched = store.fetch_by_in_list(StoreOp::GetMachines, &values, "name")?;

        let update_rows: Vec<ParamRow> = self
            .heartbeats
            .iter()
            .map(|h| vec![Arg::Int(h.last_seen), Arg::Text(h.name.clone())])
            .collect();
        store.bulk_update(StoreOp::SetMachineLastSeen, &update_rows)?;
        debug!(
            "machine: resolved {} machines ({} new, {} heartbeats)",
            fetched.len(),
            created,
            update_rows.len()
        );

        let mut resolved = HashMap::new();
        for (name, row) in fetched {
            resolved.insert(name.clone(), NamedRow { id: row.id, name });
        }
        Ok(resolved)
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.heartbeats.clear();
    }
}

impl Default for MachineResolver {
    fn default() -> Self {
        Self::new()
    }
}
