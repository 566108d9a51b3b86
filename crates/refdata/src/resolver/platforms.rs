//! Resolver for platform triples.
//!
//! Build platforms and machine platforms live in separate tables with the
//! same shape, so one resolver type serves both, parameterized by its store
//! operations. The composite key joins the triple with `-`.

use std::collections::HashMap;

use ciboard_core::{platform_key, PlatformRow};
use tracing::debug;

use crate::store::{Arg, ParamRow, RefDataStore, StoreError, StoreOp};

use super::pending::PendingSet;

/// A platform fact waiting for resolution. Carries no id.
#[derive(Debug)]
struct PlatformCandidate {
    os_name: String,
    platform: String,
    architecture: String,
}

pub struct PlatformResolver {
    label: &'static str,
    create_op: StoreOp,
    fetch_op: StoreOp,
    pending: PendingSet<String, PlatformCandidate>,
}

impl PlatformResolver {
    pub fn new(label: &'static str, create_op: StoreOp, fetch_op: StoreOp) -> Self {
        Self {
            label,
            create_op,
            fetch_op,
            pending: PendingSet::new(),
        }
    }

    /// Buffer a platform triple and return the key it will resolve under.
    pub fn add(&mut self, os_name: &str, platform: &str, architecture: &str) -> String {
        let key = platform_key(os_name, platform, architecture);
        self.pending.insert(
            key.clone(),
            PlatformCandidate {
                os_name: os_name.to_string(),
                platform: platform.to_string(),
                architecture: architecture.to_string(),
            },
        );
        key
    }

    /// Create-then-fetch every buffered triple. The fetch is constrained to
    /// exactly the buffered triples, so unrelated rows never come back.
    pub fn flush_all(
        &self,
        store: &dyn RefDataStore,
    ) -> Result<HashMap<String, PlatformRow>, StoreError> {
        if self.pending.is_empty() {
            return Ok(HashMap::new());
        }

        let triples: Vec<ParamRow> = self
            .pending
            .rows()
            .iter()
            .map(|c| {
                vec![
                    Arg::Text(c.os_name.clone()),
                    Arg::Text(c.platform.clone()),
                    Arg::Text(c.architecture.clone()),
                ]
            })
            .collect();

        let created = store.bulk_create_or_ignore(self.create_op, &triples)?;
        let fetched = store.fetch_by_predicate(self.fetch_op, &triples)?;
        debug!(
            "{}: resolved {} platforms ({} new)",
            self.label,
            fetched.len(),
            created
        );

        let mut resolved = HashMap::new();
        for row in fetched {
            let platform = PlatformRow {
                id: row.id,
                os_name: row.col(0)?.to_string(),
                platform: row.col(1)?.to_string(),
                architecture: row.col(2)?.to_string(),
            };
            resolved.insert(platform.key(), platform);
        }
        Ok(resolved)
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
