//! The resolution session: one accumulation cycle over every fact kind.
//!
//! Callers route denormalized job facts into the session, then call
//! `resolve_all` once the work unit is fully submitted. The session flushes
//! each resolver in a fixed order, hands back the combined lookups, and
//! clears its buffers so the same instance can serve the next work unit.
//! A session must not be shared across threads without external
//! serialization; its buffers are plain mutable state.

use std::collections::{BTreeSet, HashMap};

use ciboard_core::{NamedRow, PlatformRow};
use serde::{Deserialize, Serialize};

use crate::error::RefDataError;
use crate::resolver::{MachineResolver, NameResolver, OptionSetResolver, PlatformResolver};
use crate::store::{RefDataStore, StoreOp};

/// Everything one cycle resolved, keyed per category by natural key.
/// Platform keys are the `os-platform-arch` join returned by the add calls;
/// option collections are keyed by content hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedRefData {
    pub build_platforms: HashMap<String, PlatformRow>,
    pub machine_platforms: HashMap<String, PlatformRow>,
    pub job_groups: HashMap<String, NamedRow>,
    pub job_types: HashMap<String, NamedRow>,
    pub products: HashMap<String, NamedRow>,
    pub machines: HashMap<String, NamedRow>,
    pub option_collections: HashMap<String, BTreeSet<String>>,
}

pub struct RefDataSession {
    build_platforms: PlatformResolver,
    machine_platforms: PlatformResolver,
    job_groups: NameResolver,
    job_types: NameResolver,
    products: NameResolver,
    machines: MachineResolver,
    option_sets: OptionSetResolver,
}

impl RefDataSession {
    pub fn new() -> Self {
        Self {
            build_platforms: PlatformResolver::new(
                "build_platform",
                StoreOp::CreateBuildPlatform,
                StoreOp::GetBuildPlatforms,
            ),
            machine_platforms: PlatformResolver::new(
                "machine_platform",
                StoreOp::CreateMachinePlatform,
                StoreOp::GetMachinePlatforms,
            ),
            job_groups: NameResolver::new(
                "job_group",
                StoreOp::CreateJobGroup,
                StoreOp::GetJobGroups,
            ),
            job_types: NameResolver::new("job_type", StoreOp::CreateJobType, StoreOp::GetJobTypes),
            products: NameResolver::new("product", StoreOp::CreateProduct, StoreOp::GetProducts),
            machines: MachineResolver::new(),
            option_sets: OptionSetResolver::new(),
        }
    }

    /// Buffer a build platform triple; returns its lookup key.
    pub fn add_build_platform(
        &mut self,
        os_name: &str,
        platform: &str,
        architecture: &str,
    ) -> String {
        self.build_platforms.add(os_name, platform, architecture)
    }

    /// Buffer a machine platform triple; returns its lookup key.
    pub fn add_machine_platform(
        &mut self,
        os_name: &str,
        platform: &str,
        architecture: &str,
    ) -> String {
        self.machine_platforms.add(os_name, platform, architecture)
    }

    pub fn add_job_group(&mut self, name: &str) {
        self.job_groups.add(name);
    }

    pub fn add_job_type(&mut self, name: &str) {
        self.job_types.add(name);
    }

    pub fn add_product(&mut self, name: &str) {
        self.products.add(name);
    }

    /// Buffer a machine observation. Malformed observations are rejected
    /// here rather than coerced at flush time.
    pub fn add_machine(&mut self, name: &str, timestamp: i64) -> Result<(), RefDataError> {
        self.machines.add(name, timestamp)
    }

    /// Buffer an option set; returns its content hash.
    pub fn add_option_collection<I, S>(&mut self, option_set: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_sets.add(option_set)
    }

    /// Flush every resolver in fixed order and return the combined lookups,
    /// then clear all buffers. On error the buffers stay populated: the
    /// caller decides between retrying the whole cycle (creates are
    /// idempotent) and dropping it with `reset_all`. Resolvers that flushed
    /// before the failure are not rolled back.
    pub fn resolve_all(
        &mut self,
        store: &dyn RefDataStore,
    ) -> Result<ResolvedRefData, RefDataError> {
        let resolved = ResolvedRefData {
            build_platforms: self.build_platforms.flush_all(store)?,
            machine_platforms: self.machine_platforms.flush_all(store)?,
            job_groups: self.job_groups.flush_all(store)?,
            job_types: self.job_types.flush_all(store)?,
            products: self.products.flush_all(store)?,
            machines: self.machines.flush_all(store)?,
            option_collections: self.option_sets.flush_all(store)?,
        };
        self.reset_all();
        Ok(resolved)
    }

    /// Drop every pending fact without touching the store.
    pub fn reset_all(&mut self) {
        self.build_platforms.reset();
        self.machine_platforms.reset();
        self.job_groups.reset();
        self.job_types.reset();
        self.products.reset();
        self.machines.reset();
        self.option_sets.reset();
    }
}

impl Default for RefDataSession {
    fn default() -> Self {
        Self::new()
    }
}
