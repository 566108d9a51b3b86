// Integration test: full resolution cycles against a real SQLite store.
// Facts go in denormalized, resolved ids come out and feed dependent job rows.

use ciboard_refdata::{JobRow, RefDataSession, ResolvedRefData, SqliteStore};

#[test]
fn test_full_cycle_feeds_job_insert() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();

    // One job's worth of denormalized facts.
    let build_key = session.add_build_platform("linux", "fedora-40", "x86_64");
    let machine_platform_key = session.add_machine_platform("linux", "fedora-40", "x86_64");
    session.add_job_group("mochitest");
    session.add_job_type("mochitest-browser-chrome");
    session.add_product("firefox");
    session.add_machine("slave-1", 1_700_000_000).unwrap();
    let option_hash = session.add_option_collection(["debug", "asan"]);

    let resolved = session.resolve_all(&store).unwrap();

    // Attach the resolved ids onto the dependent record.
    let job = JobRow {
        guid: "3f7a51c0-job".to_string(),
        job_group_id: resolved.job_groups["mochitest"].id,
        job_type_id: resolved.job_types["mochitest-browser-chrome"].id,
        product_id: resolved.products["firefox"].id,
        build_platform_id: resolved.build_platforms[&build_key].id,
        machine_platform_id: resolved.machine_platforms[&machine_platform_key].id,
        machine_id: resolved.machines["slave-1"].id,
        option_collection_hash: option_hash.clone(),
        submit_time: 1_700_000_000,
    };
    store.insert_job(&job).unwrap();

    let loaded = store.job_by_guid("3f7a51c0-job").unwrap().unwrap();
    assert_eq!(loaded, job);
    assert!(loaded.job_group_id > 0);
    assert_eq!(loaded.option_collection_hash.len(), 40);
}

#[test]
fn test_cross_cycle_reuse_resolves_to_same_identity() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();

    let key = session.add_build_platform("windows", "11-22h2", "x86_64");
    let first = session.resolve_all(&store).unwrap();

    // Resubmitted alone in the next cycle: fetch-only, same id.
    let key_again = session.add_build_platform("windows", "11-22h2", "x86_64");
    assert_eq!(key, key_again);
    let second = session.resolve_all(&store).unwrap();

    assert_eq!(first.build_platforms[&key].id, second.build_platforms[&key].id);
}

#[test]
fn test_post_flush_batches_are_disjoint() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();

    session.add_job_group("mochitest");
    session.resolve_all(&store).unwrap();

    session.add_job_group("reftest");
    let second = session.resolve_all(&store).unwrap();

    // Nothing from the first batch leaks into the second lookup.
    assert_eq!(second.job_groups.len(), 1);
    assert!(second.job_groups.contains_key("reftest"));
    assert!(!second.job_groups.contains_key("mochitest"));
}

#[test]
fn test_machine_heartbeat_across_cycles() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();

    session.add_machine("slave-9", 1_000).unwrap();
    session.add_machine("slave-9", 2_000).unwrap();
    let first = session.resolve_all(&store).unwrap();

    session.add_machine("slave-9", 3_000).unwrap();
    let second = session.resolve_all(&store).unwrap();
    assert_eq!(first.machines["slave-9"].id, second.machines["slave-9"].id);

    // First observation pinned first_seen; the latest heartbeat moved
    // last_seen even though the machine already existed.
    let row = store.machine_by_name("slave-9").unwrap().unwrap();
    assert_eq!(row.first_seen, 1_000);
    assert_eq!(row.last_seen, 3_000);
}

#[test]
fn test_equivalent_option_sets_share_one_collection() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();

    let first = session.add_option_collection(["debug", "asan"]);
    let second = session.add_option_collection(["asan", "debug", "asan"]);
    assert_eq!(first, second);

    let resolved = session.resolve_all(&store).unwrap();
    assert_eq!(resolved.option_collections.len(), 1);

    let stored = store.all_option_collections().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[&first], vec!["asan", "debug"]);
}

#[test]
fn test_resolved_lookups_serialize() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = RefDataSession::new();
    session.add_machine("slave-1", 500).unwrap();
    session.add_product("firefox");
    let resolved = session.resolve_all(&store).unwrap();

    let json = serde_json::to_string(&resolved).unwrap();
    let back: ResolvedRefData = serde_json::from_str(&json).unwrap();
    assert_eq!(back.machines["slave-1"].id, resolved.machines["slave-1"].id);
    assert_eq!(back.products["firefox"].name, "firefox");
}
