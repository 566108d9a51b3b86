//! CI reference data resolution
//!
//! The refdata crate turns streams of denormalized job facts (platform
//! triples, group/type/product names, machine observations, option sets)
//! into stable integer identities in a SQLite store, creating rows that do
//! not exist yet and reusing rows that do.
//!
//! ## Architecture
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────┐
//!  │                      RefDataSession                        │
//!  │                                                            │
//!  │  ┌───────────┐  ┌───────────┐  ┌──────────┐  ┌─────────┐  │
//!  │  │ Platforms │  │   Names   │  │ Machines │  │ Options │  │
//!  │  └─────┬─────┘  └─────┬─────┘  └────┬─────┘  └────┬────┘  │
//!  │        └──────────────┴──────┬──────┴─────────────┘       │
//!  │                              ▼                            │
//!  │            bulk create, constrained fetch, update         │
//!  └──────────────────────────────┬─────────────────────────────┘
//!                                 ▼
//!                      RefDataStore (SQLite)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use ciboard_refdata::{RefDataSession, SqliteStore};
//!
//! let store = SqliteStore::open(&path)?;
//! let mut session = RefDataSession::new();
//!
//! session.add_job_group("mochitest");
//! session.add_machine("slave-1", submit_time)?;
//! let hash = session.add_option_collection(["debug", "asan"]);
//!
//! let resolved = session.resolve_all(&store)?;
//! let machine_id = resolved.machines["slave-1"].id;
//! ```

pub mod error;
pub mod resolver;
pub mod session;
pub mod store;

// Maintenance paths outside the resolution engine
pub mod repository;

pub use error::RefDataError;
pub use resolver::{
    MachineResolver, NameResolver, OptionSetResolver, PendingSet, PlatformResolver,
};
pub use session::{RefDataSession, ResolvedRefData};
pub use store::{
    Arg, FetchedRow, JobRow, ParamRow, RefDataStore, Repository, SqliteStore, StoreError, StoreOp,
};

pub use repository::{RepositoryError, RepositoryVersions};

// Re-export the identity primitives so downstream crates need only one
// dependency.
pub use ciboard_core::{option_collection_hash, platform_key, MachineRow, NamedRow, PlatformRow};
