//! Named store operations and their SQL templates.
//!
//! Every statement the resolution engine can trigger is registered here
//! under a logical name. Variable-size operations carry one expansion slot:
//! `{in_list}` becomes one `?` per submitted value, `{predicates}` becomes
//! one instance of the compound predicate per submitted param row,
//! OR-joined. Bulk create/update templates have no slot; they are prepared
//! once and executed per row.

use std::fmt;

/// Logical name of a prepared store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateBuildPlatform,
    GetBuildPlatforms,
    CreateMachinePlatform,
    GetMachinePlatforms,
    CreateJobGroup,
    GetJobGroups,
    CreateJobType,
    GetJobTypes,
    CreateProduct,
    GetProducts,
    CreateMachine,
    GetMachines,
    SetMachineLastSeen,
    CreateOption,
    GetOptions,
    CreateOptionCollection,
}

/// How a template's SQL grows with the submitted row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expansion {
    /// Fixed SQL, executed once per param row.
    None,
    /// `{in_list}` slot: one `?` per value, comma-joined.
    InList,
    /// `{predicates}` slot: the fragment repeated per param row, OR-joined.
    Predicates(&'static str),
}

/// A registered SQL template. `columns` lists the select columns of fetch
/// templates in order, surrogate id first; it is empty for writes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SqlTemplate {
    pub sql: &'static str,
    pub expand: Expansion,
    pub columns: &'static [&'static str],
}

const PLATFORM_PREDICATE: &str = "(os_name = ? AND platform = ? AND architecture = ?)";

impl SqlTemplate {
    /// SQL with the expansion slot substituted for `n` submitted rows.
    /// `None` when the template has no slot.
    pub fn expanded(&self, n: usize) -> Option<String> {
        match self.expand {
            Expansion::None => None,
            Expansion::InList => {
                let placeholders = vec!["?"; n].join(", ");
                Some(self.sql.replace("{in_list}", &placeholders))
            }
            Expansion::Predicates(fragment) => {
                let clause = vec![fragment; n].join(" OR ");
                Some(self.sql.replace("{predicates}", &clause))
            }
        }
    }
}

impl StoreOp {
    /// Stable operation name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            StoreOp::CreateBuildPlatform => "create_build_platform",
            StoreOp::GetBuildPlatforms => "get_build_platforms",
            StoreOp::CreateMachinePlatform => "create_machine_platform",
            StoreOp::GetMachinePlatforms => "get_machine_platforms",
            StoreOp::CreateJobGroup => "create_job_group",
            StoreOp::GetJobGroups => "get_job_groups",
            StoreOp::CreateJobType => "create_job_type",
            StoreOp::GetJobTypes => "get_job_types",
            StoreOp::CreateProduct => "create_product",
            StoreOp::GetProducts => "get_products",
            StoreOp::CreateMachine => "create_machine",
            StoreOp::GetMachines => "get_machines",
            StoreOp::SetMachineLastSeen => "set_machine_last_seen",
            StoreOp::CreateOption => "create_option",
            StoreOp::GetOptions => "get_options",
            StoreOp::CreateOptionCollection => "create_option_collection",
        }
    }

    pub(crate) fn template(self) -> SqlTemplate {
        match self {
            StoreOp::CreateBuildPlatform => SqlTemplate {
                sql: "INSERT OR IGNORE INTO build_platform (os_name, platform, architecture) \
                      VALUES (?1, ?2, ?3)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetBuildPlatforms => SqlTemplate {
                sql: "SELECT id, os_name, platform, architecture FROM build_platform \
                      WHERE {predicates}",
                expand: Expansion::Predicates(PLATFORM_PREDICATE),
                columns: &["id", "os_name", "platform", "architecture"],
            },
            StoreOp::CreateMachinePlatform => SqlTemplate {
                sql: "INSERT OR IGNORE INTO machine_platform (os_name, platform, architecture) \
                      VALUES (?1, ?2, ?3)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetMachinePlatforms => SqlTemplate {
                sql: "SELECT id, os_name, platform, architecture FROM machine_platform \
                      WHERE {predicates}",
                expand: Expansion::Predicates(PLATFORM_PREDICATE),
                columns: &["id", "os_name", "platform", "architecture"],
            },
            StoreOp::CreateJobGroup => SqlTemplate {
                sql: "INSERT OR IGNORE INTO job_group (name) VALUES (?1)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetJobGroups => SqlTemplate {
                sql: "SELECT id, name FROM job_group WHERE name IN ({in_list})",
                expand: Expansion::InList,
                columns: &["id", "name"],
            },
            StoreOp::CreateJobType => SqlTemplate {
                sql: "INSERT OR IGNORE INTO job_type (name) VALUES (?1)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetJobTypes => SqlTemplate {
                sql: "SELECT id, name FROM job_type WHERE name IN ({in_list})",
                expand: Expansion::InList,
                columns: &["id", "name"],
            },
            StoreOp::CreateProduct => SqlTemplate {
                sql: "INSERT OR IGNORE INTO product (name) VALUES (?1)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetProducts => SqlTemplate {
                sql: "SELECT id, name FROM product WHERE name IN ({in_list})",
                expand: Expansion::InList,
                columns: &["id", "name"],
            },
            StoreOp::CreateMachine => SqlTemplate {
                sql: "INSERT OR IGNORE INTO machine (name, first_seen, last_seen) \
                      VALUES (?1, ?2, ?3)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetMachines => SqlTemplate {
                sql: "SELECT id, name FROM machine WHERE name IN ({in_list})",
                expand: Expansion::InList,
                columns: &["id", "name"],
            },
            // Deliberately a bare UPDATE. Folding the heartbeat into the
            // insert as an upsert has corrupted auto-increment ids before;
            // the two statements stay separate.
            StoreOp::SetMachineLastSeen => SqlTemplate {
                sql: "UPDATE machine SET last_seen = ?1 WHERE name = ?2",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::CreateOption => SqlTemplate {
                sql: "INSERT OR IGNORE INTO option (name) VALUES (?1)",
                expand: Expansion::None,
                columns: &[],
            },
            StoreOp::GetOptions => SqlTemplate {
                sql: "SELECT id, name FROM option WHERE name IN ({in_list})",
                expand: Expansion::InList,
                columns: &["id", "name"],
            },
            StoreOp::CreateOptionCollection => SqlTemplate {
                sql: "INSERT OR IGNORE INTO option_collection \
                      (option_collection_hash, option_id) VALUES (?1, ?2)",
                expand: Expansion::None,
                columns: &[],
            },
        }
    }

    /// Every registered operation.
    pub fn all() -> &'static [StoreOp] {
        &[
            StoreOp::CreateBuildPlatform,
            StoreOp::GetBuildPlatforms,
            StoreOp::CreateMachinePlatform,
            StoreOp::GetMachinePlatforms,
            StoreOp::CreateJobGroup,
            StoreOp::GetJobGroups,
            StoreOp::CreateJobType,
            StoreOp::GetJobTypes,
            StoreOp::CreateProduct,
            StoreOp::GetProducts,
            StoreOp::CreateMachine,
            StoreOp::GetMachines,
            StoreOp::SetMachineLastSeen,
            StoreOp::CreateOption,
            StoreOp::GetOptions,
            StoreOp::CreateOptionCollection,
        ]
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_operation_names_are_unique() {
        let names: HashSet<&str> = StoreOp::all().iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), StoreOp::all().len());
    }

    #[test]
    fn test_templates_declare_their_slot() {
        for op in StoreOp::all() {
            let t = op.template();
            match t.expand {
                Expansion::None => {
                    assert!(!t.sql.contains("{in_list}"), "{} has a stray slot", op);
                    assert!(!t.sql.contains("{predicates}"), "{} has a stray slot", op);
                }
                Expansion::InList => assert!(t.sql.contains("{in_list}"), "{}", op),
                Expansion::Predicates(_) => assert!(t.sql.contains("{predicates}"), "{}", op),
            }
        }
    }

    #[test]
    fn test_fetch_templates_select_id_first() {
        for op in StoreOp::all() {
            let t = op.template();
            if !t.columns.is_empty() {
                assert_eq!(t.columns[0], "id", "{} must select id first", op);
            }
        }
    }

    #[test]
    fn test_in_list_expansion_arity() {
        let t = StoreOp::GetMachines.template();
        let sql = t.expanded(3).unwrap();
        assert!(sql.contains("name IN (?, ?, ?)"));
    }

    #[test]
    fn test_predicate_expansion_or_joins() {
        let t = StoreOp::GetBuildPlatforms.template();
        let sql = t.expanded(2).unwrap();
        let expected = format!("{} OR {}", PLATFORM_PREDICATE, PLATFORM_PREDICATE);
        assert!(sql.contains(&expected));
    }

    #[test]
    fn test_fixed_templates_do_not_expand() {
        assert!(StoreOp::CreateMachine.template().expanded(5).is_none());
        assert!(StoreOp::SetMachineLastSeen.template().expanded(1).is_none());
    }
}
