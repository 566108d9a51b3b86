//! Identity-bearing rows produced by reference-data fetches.
//!
//! These are the shapes downstream consumers see after a resolution cycle:
//! the surrogate integer id plus the natural key it was resolved from.

use serde::{Deserialize, Serialize};

/// A row from a name-keyed reference table (job group, job type, product,
/// option, machine on the resolution path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

/// A row from one of the platform tables.
///
/// The natural identity is the (os_name, platform, architecture) triple;
/// `id` is the surrogate key dependent records reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRow {
    pub id: i64,
    pub os_name: String,
    pub platform: String,
    pub architecture: String,
}

impl PlatformRow {
    /// Dedup key of this row's triple.
    pub fn key(&self) -> String {
        crate::identity::platform_key(&self.os_name, &self.platform, &self.architecture)
    }
}

/// A full machine row, including both heartbeat timestamps (integer epoch
/// seconds). The resolution path only carries id and name; this shape is
/// returned by direct store accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRow {
    pub id: i64,
    pub name: String,
    pub first_seen: i64,
    pub last_seen: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_row_key_matches_helper() {
        let row = PlatformRow {
            id: 7,
            os_name: "linux".to_string(),
            platform: "fedora-40".to_string(),
            architecture: "x86_64".to_string(),
        };
        assert_eq!(row.key(), "linux-fedora-40-x86_64");
    }

    #[test]
    fn test_rows_serialize_round_trip() {
        let row = NamedRow {
            id: 3,
            name: "mochitest".to_string(),
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: NamedRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);
    }
}
