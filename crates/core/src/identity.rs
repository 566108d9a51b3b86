//! Content-derived identities for reference data.
//!
//! Two derived identities exist in this layer:
//! - the platform dedup key, an in-memory composite of the
//!   (os, platform, architecture) triple, never persisted;
//! - the option-collection hash, the persisted identity of an unordered
//!   set of option strings.

use sha1::{Digest, Sha1};
use std::collections::BTreeSet;

/// Dedup key for a platform triple: `"{os}-{platform}-{arch}"`.
///
/// Used only to deduplicate submissions within one accumulation cycle. The
/// store identity of a platform is the triple itself, not this string.
pub fn platform_key(os_name: &str, platform: &str, architecture: &str) -> String {
    format!("{}-{}-{}", os_name, platform, architecture)
}

/// Content-derived identity for an unordered set of option strings.
///
/// Members are deduplicated, sorted lexicographically, and concatenated with
/// no separator; the result is the hex-encoded SHA-1 digest of those UTF-8
/// bytes. Submission order and repeated members never change the hash.
pub fn option_collection_hash<I, S>(options: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let members: BTreeSet<String> = options.into_iter().map(Into::into).collect();

    let mut hasher = Sha1::new();
    for member in &members {
        hasher.update(member.as_bytes());
    }
    hex::encode(hasher.finalize())
}
