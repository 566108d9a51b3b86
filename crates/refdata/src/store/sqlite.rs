// SQLite-backed reference store.
//
// Owns every piece of SQL in the crate: the schema, the template registry
// execution, and the direct accessors used by maintenance paths. SQLite has
// a single write path, so the primary-visibility requirement of the store
// contract holds structurally here.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use ciboard_core::MachineRow;

use super::templates::{Expansion, SqlTemplate, StoreOp};
use super::{Arg, FetchedRow, ParamRow, RefDataStore, StoreError};

/// A repository whose upstream version is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub dvcs_type: String,
    pub url: String,
    pub active_status: String,
}

/// A dependent job record carrying resolved reference ids. `guid` is the
/// natural key; the surrogate id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRow {
    pub guid: String,
    pub job_group_id: i64,
    pub job_type_id: i64,
    pub product_id: i64,
    pub build_platform_id: i64,
    pub machine_platform_id: i64,
    pub machine_id: i64,
    pub option_collection_hash: String,
    pub submit_time: i64,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            -- Reference tables: surrogate id plus a unique natural key.
            CREATE TABLE IF NOT EXISTS build_platform (
                id INTEGER PRIMARY KEY,
                os_name TEXT NOT NULL,
                platform TEXT NOT NULL,
                architecture TEXT NOT NULL,
                UNIQUE (os_name, platform, architecture)
            );

            CREATE TABLE IF NOT EXISTS machine_platform (
                id INTEGER PRIMARY KEY,
                os_name TEXT NOT NULL,
                platform TEXT NOT NULL,
                architecture TEXT NOT NULL,
                UNIQUE (os_name, platform, architecture)
            );

            CREATE TABLE IF NOT EXISTS job_group (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS job_type (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS product (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS machine (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                first_seen INTEGER NOT NULL,
                last_seen INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS option (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            -- The 40-char hex hash is the collection identity; members are
            -- junction rows against option.
            CREATE TABLE IF NOT EXISTS option_collection (
                option_collection_hash TEXT NOT NULL,
                option_id INTEGER NOT NULL REFERENCES option(id),
                UNIQUE (option_collection_hash, option_id)
            );

            CREATE TABLE IF NOT EXISTS repository (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                dvcs_type TEXT NOT NULL,
                url TEXT NOT NULL,
                active_status TEXT NOT NULL DEFAULT 'active'
            );

            CREATE TABLE IF NOT EXISTS repository_version (
                id INTEGER PRIMARY KEY,
                repository_id INTEGER NOT NULL REFERENCES repository(id),
                version TEXT NOT NULL,
                version_timestamp INTEGER NOT NULL,
                UNIQUE (repository_id, version)
            );

            -- Downstream records that consume resolved reference ids.
            CREATE TABLE IF NOT EXISTS job (
                id INTEGER PRIMARY KEY,
                guid TEXT NOT NULL UNIQUE,
                job_group_id INTEGER NOT NULL,
                job_type_id INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                build_platform_id INTEGER NOT NULL,
                machine_platform_id INTEGER NOT NULL,
                machine_id INTEGER NOT NULL,
                option_collection_hash TEXT NOT NULL,
                submit_time INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS failure_line (
                id INTEGER PRIMARY KEY,
                job_guid TEXT NOT NULL,
                line INTEGER NOT NULL,
                message TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_option_collection_hash
                ON option_collection(option_collection_hash);

            CREATE INDEX IF NOT EXISTS idx_repository_version_repo
                ON repository_version(repository_id);

            CREATE INDEX IF NOT EXISTS idx_job_submit_time
                ON job(submit_time);

            CREATE INDEX IF NOT EXISTS idx_failure_line_job_guid
                ON failure_line(job_guid);
        "#,
        )?;
        Ok(())
    }

    /// Prepare a fixed template once and execute it per param row, all in
    /// one transaction.
    fn execute_many(&self, op: StoreOp, rows: &[ParamRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let template = op.template();
        if template.expand != Expansion::None {
            return Err(StoreError::TemplateMisuse {
                op: op.name(),
                detail: "expanding template used as a bulk write".to_string(),
            });
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare(template.sql)?;
            for row in rows {
                affected += stmt.execute(rusqlite::params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    // ==========================================================================
    // Read Accessors (off the resolution hot path)
    // ==========================================================================

    /// Every stored option collection with its member option names, keyed by
    /// hash. Members come back sorted.
    pub fn all_option_collections(&self) -> Result<HashMap<String, Vec<String>>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT oc.option_collection_hash, o.name
             FROM option_collection oc
             JOIN option o ON o.id = oc.option_id
             ORDER BY oc.option_collection_hash, o.name",
        )?;
        let mut rows = stmt.query([])?;

        let mut collections: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let hash: String = row.get(0)?;
            let name: String = row.get(1)?;
            collections.entry(hash).or_default().push(name);
        }
        Ok(collections)
    }

    /// Full machine row by name, both heartbeat timestamps included.
    pub fn machine_by_name(&self, name: &str) -> Result<Option<MachineRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, first_seen, last_seen FROM machine WHERE name = ?1")?;
        let mut rows = stmt.query(params![name])?;

        if let Some(row) = rows.next()? {
            Ok(Some(MachineRow {
                id: row.get(0)?,
                name: row.get(1)?,
                first_seen: row.get(2)?,
                last_seen: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }

    // ==========================================================================
    // Repository Operations
    // ==========================================================================

    /// Register a repository if absent; returns its id either way.
    pub fn create_repository(
        &self,
        name: &str,
        dvcs_type: &str,
        url: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO repository (name, dvcs_type, url) VALUES (?1, ?2, ?3)",
            params![name, dvcs_type, url],
        )?;
        let id = conn.query_row(
            "SELECT id FROM repository WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn repository_by_name(&self, name: &str) -> Result<Option<Repository>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, dvcs_type, url, active_status FROM repository WHERE name = ?1",
        )?;
        let mut rows = stmt.query(params![name])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Repository {
                id: row.get(0)?,
                name: row.get(1)?,
                dvcs_type: row.get(2)?,
                url: row.get(3)?,
                active_status: row.get(4)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Insert the (repository, version) pair if unseen, refresh its
    /// timestamp either way, and return the version row id.
    pub fn get_or_create_repository_version(
        &self,
        repository_id: i64,
        version: &str,
        timestamp: i64,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO repository_version (repository_id, version, version_timestamp)
             VALUES (?1, ?2, ?3)",
            params![repository_id, version, timestamp],
        )?;
        conn.execute(
            "UPDATE repository_version SET version_timestamp = ?1
             WHERE repository_id = ?2 AND version = ?3",
            params![timestamp, repository_id, version],
        )?;
        let id = conn.query_row(
            "SELECT id FROM repository_version WHERE repository_id = ?1 AND version = ?2",
            params![repository_id, version],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// (id, version_timestamp) of a tracked version, if present.
    pub fn repository_version(
        &self,
        repository_id: i64,
        version: &str,
    ) -> Result<Option<(i64, i64)>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, version_timestamp FROM repository_version
             WHERE repository_id = ?1 AND version = ?2",
        )?;
        let mut rows = stmt.query(params![repository_id, version])?;

        if let Some(row) = rows.next()? {
            Ok(Some((row.get(0)?, row.get(1)?)))
        } else {
            Ok(None)
        }
    }

    // ==========================================================================
    // Job and Failure Line Operations
    // ==========================================================================

    pub fn insert_job(&self, job: &JobRow) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO job
               (guid, job_group_id, job_type_id, product_id, build_platform_id,
                machine_platform_id, machine_id, option_collection_hash, submit_time)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                job.guid,
                job.job_group_id,
                job.job_type_id,
                job.product_id,
                job.build_platform_id,
                job.machine_platform_id,
                job.machine_id,
                job.option_collection_hash,
                job.submit_time
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn job_by_guid(&self, guid: &str) -> Result<Option<JobRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT guid, job_group_id, job_type_id, product_id, build_platform_id,
                    machine_platform_id, machine_id, option_collection_hash, submit_time
             FROM job WHERE guid = ?1",
        )?;
        let mut rows = stmt.query(params![guid])?;

        if let Some(row) = rows.next()? {
            Ok(Some(JobRow {
                guid: row.get(0)?,
                job_group_id: row.get(1)?,
                job_type_id: row.get(2)?,
                product_id: row.get(3)?,
                build_platform_id: row.get(4)?,
                machine_platform_id: row.get(5)?,
                machine_id: row.get(6)?,
                option_collection_hash: row.get(7)?,
                submit_time: row.get(8)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn delete_job(&self, guid: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute("DELETE FROM job WHERE guid = ?1", params![guid])?;
        Ok(count > 0)
    }

    pub fn insert_failure_line(
        &self,
        job_guid: &str,
        line: i64,
        message: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO failure_line (job_guid, line, message) VALUES (?1, ?2, ?3)",
            params![job_guid, line, message],
        )?;
        Ok(())
    }

    pub fn failure_line_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM failure_line", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Distinct job guids referenced by orphaned failure lines, examining at
    /// most `chunk_size` lines. Guids come back in first-seen order.
    pub fn orphaned_failure_line_guids(
        &self,
        chunk_size: usize,
    ) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT fl.job_guid FROM failure_line fl
             LEFT JOIN job j ON j.guid = fl.job_guid
             WHERE j.guid IS NULL
             LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![chunk_size as i64])?;

        let mut guids = Vec::new();
        let mut seen = HashSet::new();
        while let Some(row) = rows.next()? {
            let guid: String = row.get(0)?;
            if seen.insert(guid.clone()) {
                guids.push(guid);
            }
        }
        Ok(guids)
    }

    /// Delete every failure line referencing one of `guids`. Returns the
    /// number of lines removed.
    pub fn delete_failure_lines_by_guid(&self, guids: &[String]) -> Result<usize, StoreError> {
        if guids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; guids.len()].join(", ");
        let sql = format!(
            "DELETE FROM failure_line WHERE job_guid IN ({})",
            placeholders
        );
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(&sql, rusqlite::params_from_iter(guids.iter()))?;
        Ok(count)
    }
}

impl RefDataStore for SqliteStore {
    fn bulk_create_or_ignore(&self, op: StoreOp, rows: &[ParamRow]) -> Result<usize, StoreError> {
        self.execute_many(op, rows)
    }

    fn bulk_update(&self, op: StoreOp, rows: &[ParamRow]) -> Result<usize, StoreError> {
        self.execute_many(op, rows)
    }

    fn fetch_by_predicate(
        &self,
        op: StoreOp,
        predicates: &[ParamRow],
    ) -> Result<Vec<FetchedRow>, StoreError> {
        if predicates.is_empty() {
            return Ok(Vec::new());
        }
        let template = op.template();
        if !matches!(template.expand, Expansion::Predicates(_)) {
            return Err(StoreError::TemplateMisuse {
                op: op.name(),
                detail: "not a predicate fetch".to_string(),
            });
        }
        let sql = template
            .expanded(predicates.len())
            .unwrap_or_else(|| template.sql.to_string());

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let flat = predicates.iter().flat_map(|row| row.iter());
        let mut rows = stmt.query(rusqlite::params_from_iter(flat))?;

        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            fetched.push(read_row(&template, row)?);
        }
        Ok(fetched)
    }

    fn fetch_by_in_list(
        &self,
        op: StoreOp,
        values: &[Arg],
        key_column: &str,
    ) -> Result<HashMap<String, FetchedRow>, StoreError> {
        if values.is_empty() {
            return Ok(HashMap::new());
        }
        let template = op.template();
        if template.expand != Expansion::InList {
            return Err(StoreError::TemplateMisuse {
                op: op.name(),
                detail: "not an in-list fetch".to_string(),
            });
        }
        let key_idx = template
            .columns
            .iter()
            .position(|c| *c == key_column)
            .ok_or_else(|| StoreError::TemplateMisuse {
                op: op.name(),
                detail: format!("no select column named {}", key_column),
            })?;
        if key_idx == 0 {
            return Err(StoreError::TemplateMisuse {
                op: op.name(),
                detail: "key column must be a text column".to_string(),
            });
        }
        let sql = template
            .expanded(values.len())
            .unwrap_or_else(|| template.sql.to_string());

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;

        let mut keyed = HashMap::new();
        while let Some(row) = rows.next()? {
            let fetched = read_row(&template, row)?;
            let key = fetched.col(key_idx - 1)?.to_string();
            keyed.insert(key, fetched);
        }
        Ok(keyed)
    }
}

impl rusqlite::ToSql for Arg {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            Arg::Text(s) => s.to_sql(),
            Arg::Int(i) => i.to_sql(),
        }
    }
}

fn read_row(template: &SqlTemplate, row: &rusqlite::Row<'_>) -> Result<FetchedRow, StoreError> {
    let id: i64 = row.get(0)?;
    let mut cols = Vec::with_capacity(template.columns.len().saturating_sub(1));
    for idx in 1..template.columns.len() {
        cols.push(row.get::<_, String>(idx)?);
    }
    Ok(FetchedRow { id, cols })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Arg {
        Arg::Text(s.to_string())
    }

    fn platform_row(os: &str, platform: &str, arch: &str) -> ParamRow {
        vec![text(os), text(platform), text(arch)]
    }

    #[test]
    fn test_create_or_ignore_deduplicates() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rows = vec![platform_row("linux", "fedora-40", "x86_64")];

        let created = store
            .bulk_create_or_ignore(StoreOp::CreateBuildPlatform, &rows)
            .unwrap();
        assert_eq!(created, 1);

        // Second create collides with the unique triple and is skipped.
        let created = store
            .bulk_create_or_ignore(StoreOp::CreateBuildPlatform, &rows)
            .unwrap();
        assert_eq!(created, 0);

        let fetched = store
            .fetch_by_predicate(StoreOp::GetBuildPlatforms, &rows)
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].col(0).unwrap(), "linux");
        assert_eq!(fetched[0].col(1).unwrap(), "fedora-40");
        assert_eq!(fetched[0].col(2).unwrap(), "x86_64");
    }

    #[test]
    fn test_predicate_fetch_matches_only_submitted_triples() {
        let store = SqliteStore::open_in_memory().unwrap();
        let all = vec![
            platform_row("linux", "fedora-40", "x86_64"),
            platform_row("linux", "fedora-40", "aarch64"),
            platform_row("windows", "11-22h2", "x86_64"),
        ];
        store
            .bulk_create_or_ignore(StoreOp::CreateBuildPlatform, &all)
            .unwrap();

        let subset = vec![
            platform_row("linux", "fedora-40", "x86_64"),
            platform_row("windows", "11-22h2", "x86_64"),
        ];
        let fetched = store
            .fetch_by_predicate(StoreOp::GetBuildPlatforms, &subset)
            .unwrap();
        assert_eq!(fetched.len(), 2);
    }

    #[test]
    fn test_in_list_fetch_keyed_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rows = vec![vec![text("mochitest")], vec![text("reftest")]];
        store
            .bulk_create_or_ignore(StoreOp::CreateJobGroup, &rows)
            .unwrap();

        let values = vec![text("mochitest"), text("reftest"), text("unknown")];
        let keyed = store
            .fetch_by_in_list(StoreOp::GetJobGroups, &values, "name")
            .unwrap();
        assert_eq!(keyed.len(), 2);
        assert!(keyed.contains_key("mochitest"));
        assert!(keyed.contains_key("reftest"));
        assert!(keyed["mochitest"].id > 0);
    }

    #[test]
    fn test_machine_heartbeat_is_update_not_upsert() {
        let store = SqliteStore::open_in_memory().unwrap();
        let create = vec![vec![text("slave-1"), Arg::Int(100), Arg::Int(100)]];
        store
            .bulk_create_or_ignore(StoreOp::CreateMachine, &create)
            .unwrap();
        let original = store.machine_by_name("slave-1").unwrap().unwrap();

        // Re-create with later timestamps: ignored, first_seen untouched.
        let recreate = vec![vec![text("slave-1"), Arg::Int(200), Arg::Int(200)]];
        store
            .bulk_create_or_ignore(StoreOp::CreateMachine, &recreate)
            .unwrap();

        // Heartbeat lands through the explicit update.
        let updates = vec![vec![Arg::Int(200), text("slave-1")]];
        let affected = store
            .bulk_update(StoreOp::SetMachineLastSeen, &updates)
            .unwrap();
        assert_eq!(affected, 1);

        let after = store.machine_by_name("slave-1").unwrap().unwrap();
        assert_eq!(after.id, original.id);
        assert_eq!(after.first_seen, 100);
        assert_eq!(after.last_seen, 200);
    }

    #[test]
    fn test_empty_inputs_are_no_ops() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(
            store
                .bulk_create_or_ignore(StoreOp::CreateProduct, &[])
                .unwrap(),
            0
        );
        assert!(store
            .fetch_by_predicate(StoreOp::GetBuildPlatforms, &[])
            .unwrap()
            .is_empty());
        assert!(store
            .fetch_by_in_list(StoreOp::GetProducts, &[], "name")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_template_misuse_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();

        let err = store
            .bulk_create_or_ignore(StoreOp::GetJobGroups, &[vec![text("x")]])
            .unwrap_err();
        assert!(matches!(err, StoreError::TemplateMisuse { .. }));

        let err = store
            .fetch_by_in_list(StoreOp::GetJobGroups, &[text("x")], "id")
            .unwrap_err();
        assert!(matches!(err, StoreError::TemplateMisuse { .. }));
    }

    #[test]
    fn test_option_collections_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .bulk_create_or_ignore(
                StoreOp::CreateOption,
                &[vec![text("debug")], vec![text("asan")]],
            )
            .unwrap();
        let options = store
            .fetch_by_in_list(
                StoreOp::GetOptions,
                &[text("debug"), text("asan")],
                "name",
            )
            .unwrap();

        let hash = "0000000000000000000000000000000000000000";
        let junction: Vec<ParamRow> = options
            .values()
            .map(|row| vec![text(hash), Arg::Int(row.id)])
            .collect();
        store
            .bulk_create_or_ignore(StoreOp::CreateOptionCollection, &junction)
            .unwrap();

        let collections = store.all_option_collections().unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[hash], vec!["asan", "debug"]);
    }

    #[test]
    fn test_schema_is_idempotent_across_reopens() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("refdata.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .bulk_create_or_ignore(StoreOp::CreateProduct, &[vec![text("firefox")]])
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let keyed = store
            .fetch_by_in_list(StoreOp::GetProducts, &[text("firefox")], "name")
            .unwrap();
        assert_eq!(keyed.len(), 1);
    }

    #[test]
    fn test_repository_version_refresh() {
        let store = SqliteStore::open_in_memory().unwrap();
        let repo_id = store
            .create_repository("mozilla-central", "hg", "https://hg.example.org/mozilla-central")
            .unwrap();

        let v1 = store
            .get_or_create_repository_version(repo_id, "130.0a1", 1_000)
            .unwrap();
        let v2 = store
            .get_or_create_repository_version(repo_id, "130.0a1", 2_000)
            .unwrap();
        assert_eq!(v1, v2);

        let (_, ts) = store.repository_version(repo_id, "130.0a1").unwrap().unwrap();
        assert_eq!(ts, 2_000);

        // Registering the same repository again returns the existing id.
        let again = store
            .create_repository("mozilla-central", "hg", "https://hg.example.org/mozilla-central")
            .unwrap();
        assert_eq!(again, repo_id);
    }

    #[test]
    fn test_orphaned_failure_lines() {
        let store = SqliteStore::open_in_memory().unwrap();
        let job = JobRow {
            guid: "job-live".to_string(),
            job_group_id: 1,
            job_type_id: 1,
            product_id: 1,
            build_platform_id: 1,
            machine_platform_id: 1,
            machine_id: 1,
            option_collection_hash: "aa".repeat(20),
            submit_time: 100,
        };
        store.insert_job(&job).unwrap();

        store.insert_failure_line("job-live", 1, "TEST-UNEXPECTED-FAIL").unwrap();
        store.insert_failure_line("job-gone", 1, "leaked window").unwrap();
        store.insert_failure_line("job-gone", 2, "leaked docshell").unwrap();

        let guids = store.orphaned_failure_line_guids(100).unwrap();
        assert_eq!(guids, vec!["job-gone".to_string()]);

        let removed = store.delete_failure_lines_by_guid(&guids).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.failure_line_count().unwrap(), 1);

        // Nothing left to purge.
        assert!(store.orphaned_failure_line_guids(100).unwrap().is_empty());
    }

    #[test]
    fn test_orphan_chunk_bounds_lines_examined() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_failure_line("gone-a", 1, "a1").unwrap();
        store.insert_failure_line("gone-a", 2, "a2").unwrap();
        store.insert_failure_line("gone-b", 1, "b1").unwrap();

        // A chunk of two only reaches the first guid's lines.
        let guids = store.orphaned_failure_line_guids(2).unwrap();
        assert_eq!(guids, vec!["gone-a".to_string()]);

        // Deleting by guid removes every line for it, then the next run
        // picks up the remainder.
        store.delete_failure_lines_by_guid(&guids).unwrap();
        let guids = store.orphaned_failure_line_guids(2).unwrap();
        assert_eq!(guids, vec!["gone-b".to_string()]);
    }

    #[test]
    fn test_job_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let job = JobRow {
            guid: "8c9c33f5".to_string(),
            job_group_id: 2,
            job_type_id: 3,
            product_id: 4,
            build_platform_id: 5,
            machine_platform_id: 6,
            machine_id: 7,
            option_collection_hash: "ab".repeat(20),
            submit_time: 1_700_000_000,
        };
        let row_id = store.insert_job(&job).unwrap();
        assert!(row_id > 0);

        let loaded = store.job_by_guid("8c9c33f5").unwrap().unwrap();
        assert_eq!(loaded, job);

        assert!(store.delete_job("8c9c33f5").unwrap());
        assert!(store.job_by_guid("8c9c33f5").unwrap().is_none());
    }
}
