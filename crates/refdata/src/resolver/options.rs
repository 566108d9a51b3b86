//! Resolver for options and option collections.
//!
//! Individual option names resolve like any other name table. A collection
//! of options resolves to its content hash, with membership stored as
//! (hash, option_id) junction rows. Option ids must be resolved before the
//! junction rows can be built, so the flush runs in two passes.

use std::collections::{BTreeSet, HashMap};

use ciboard_core::option_collection_hash;
use tracing::debug;

use crate::store::{Arg, ParamRow, RefDataStore, StoreError, StoreOp};

use super::pending::PendingSet;

/// An option set waiting for resolution, keyed by its content hash.
#[derive(Debug)]
struct OptionSetCandidate {
    hash: String,
    members: BTreeSet<String>,
}

pub struct OptionSetResolver {
    options: PendingSet<String, String>,
    collections: PendingSet<String, OptionSetCandidate>,
}

impl OptionSetResolver {
    pub fn new() -> Self {
        Self {
            options: PendingSet::new(),
            collections: PendingSet::new(),
        }
    }

    /// Buffer an option set and return its content hash. Member options not
    /// already pending this cycle are queued for creation; sets with
    /// identical membership collapse to one pending collection.
    pub fn add<I, S>(&mut self, option_set: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: BTreeSet<String> = option_set.into_iter().map(Into::into).collect();
        let hash = option_collection_hash(members.iter().map(String::as_str));

        for member in &members {
            self.options.insert(member.clone(), member.clone());
        }
        self.collections.insert(
            hash.clone(),
            OptionSetCandidate {
                hash: hash.clone(),
                members,
            },
        );
        hash
    }

    /// Resolve pending options to ids, then store one junction row per
    /// (hash, member). Returns every pending hash with its member set. A
    /// cycle whose collections carry no members stores nothing and returns
    /// empty without contacting the store.
    pub fn flush_all(
        &self,
        store: &dyn RefDataStore,
    ) -> Result<HashMap<String, BTreeSet<String>>, StoreError> {
        let has_members = self
            .collections
            .rows()
            .iter()
            .any(|c| !c.members.is_empty());
        if !has_members {
            return Ok(HashMap::new());
        }

        let options = self.resolve_options(store)?;

        let mut junction_rows: Vec<ParamRow> = Vec::new();
        for collection in self.collections.rows() {
            for member in &collection.members {
                let option_id =
                    *options
                        .get(member)
                        .ok_or_else(|| StoreError::MalformedRow {
                            detail: format!("option {:?} missing from fetch", member),
                        })?;
                junction_rows.push(vec![
                    Arg::Text(collection.hash.clone()),
                    Arg::Int(option_id),
                ]);
            }
        }
        store.bulk_create_or_ignore(StoreOp::CreateOptionCollection, &junction_rows)?;
        debug!(
            "option_collection: stored {} junction rows across {} collections",
            junction_rows.len(),
            self.collections.len()
        );

        let mut resolved = HashMap::new();
        for collection in self.collections.rows() {
            resolved.insert(collection.hash.clone(), collection.members.clone());
        }
        Ok(resolved)
    }

    fn resolve_options(
        &self,
        store: &dyn RefDataStore,
    ) -> Result<HashMap<String, i64>, StoreError> {
        let create_rows: Vec<ParamRow> = self
            .options
            .rows()
            .iter()
            .map(|name| vec![Arg::Text(name.clone())])
            .collect();
        let created = store.bulk_create_or_ignore(StoreOp::CreateOption, &create_rows)?;

        let values: Vec<Arg> = self
            .options
            .rows()
            .iter()
            .map(|name| Arg::Text(name.clone()))
            .collect();
        let fetched = store.fetch_by_in_list(StoreOp::GetOptions, &values, "name")?;
        debug!(
            "option: resolved {} options ({} new)",
            fetched.len(),
            created
        );

        Ok(fetched.into_iter().map(|(name, row)| (name, row.id)).collect())
    }

    pub fn reset(&mut self) {
        self.options.clear();
        self.collections.clear();
    }
}

impl Default for OptionSetResolver {
    fn default() -> Self {
        Self::new()
    }
}
