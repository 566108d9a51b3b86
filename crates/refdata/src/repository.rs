//! Repository version bookkeeping.
//!
//! Tracked repositories publish their current version as the last line of a
//! milestone file served from the repository root. Only Mercurial
//! repositories are supported; anything else is a configuration failure,
//! reported before any network traffic happens.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::store::{SqliteStore, StoreError};

const MILESTONE_PATH: &str = "raw-file/default/config/milestone.txt";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unknown repository: {name}")]
    UnknownRepository { name: String },

    /// Fixed configuration failure; retrying cannot help.
    #[error("unsupported dvcs type {dvcs_type:?} for repository {name}")]
    UnsupportedDvcs { name: String, dvcs_type: String },

    #[error("version fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no version found in milestone file at {url}")]
    EmptyMilestone { url: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct RepositoryVersions<'a> {
    store: &'a SqliteStore,
    client: reqwest::blocking::Client,
}

impl<'a> RepositoryVersions<'a> {
    pub fn new(store: &'a SqliteStore) -> Result<Self, RepositoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { store, client })
    }

    /// Fetch the current upstream version of a registered repository and
    /// record it, stamping the observation time. Returns the version string.
    pub fn update(&self, repository_name: &str) -> Result<String, RepositoryError> {
        let repository = self.store.repository_by_name(repository_name)?.ok_or_else(|| {
            RepositoryError::UnknownRepository {
                name: repository_name.to_string(),
            }
        })?;
        if repository.dvcs_type != "hg" {
            return Err(RepositoryError::UnsupportedDvcs {
                name: repository.name,
                dvcs_type: repository.dvcs_type,
            });
        }

        let version = self.hg_repository_version(&repository.url)?;
        let timestamp = Utc::now().timestamp();
        self.store
            .get_or_create_repository_version(repository.id, &version, timestamp)?;
        info!("repository {}: version {}", repository_name, version);
        Ok(version)
    }

    fn hg_repository_version(&self, repo_url: &str) -> Result<String, RepositoryError> {
        let url = format!("{}/{}", repo_url.trim_end_matches('/'), MILESTONE_PATH);
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;
        parse_milestone(&body).ok_or(RepositoryError::EmptyMilestone { url })
    }
}

/// The version is the last non-empty line of the milestone file.
fn parse_milestone(body: &str) -> Option<String> {
    body.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
