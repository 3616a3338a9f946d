//! Key layout in the key-value store.
//!
//! These names are shared with every other reader of the same store and must
//! not change.

use chrono::NaiveDate;

/// Hash holding every user record, field = username.
pub const USERS: &str = "users";

/// Sorted set of every link id, scored by save time.
pub const GLOBAL_LINK_INDEX: &str = "links";

/// Sorted set of link ids whose history purge did not complete.
pub const HISTORY_TOMBSTONES: &str = "orphans:history";

/// Prefix of the per-owner link indices (`links:<username>`).
pub const OWNER_LINK_INDEX_PREFIX: &str = "links:";

pub fn link(id: &str) -> String {
    format!("link:{id}")
}

pub fn owner_links(username: &str) -> String {
    format!("{OWNER_LINK_INDEX_PREFIX}{username}")
}

/// Index to page through: one owner's links, or all links.
pub fn link_index(owner: Option<&str>) -> String {
    match owner {
        Some(username) => owner_links(username),
        None => GLOBAL_LINK_INDEX.to_string(),
    }
}

pub fn history(id: &str, day: NaiveDate) -> String {
    format!("history:{id}:{}", day.format("%Y%m%d"))
}

/// Scan pattern matching every daily history bucket of a link.
///
/// Glob metacharacters in `id` are escaped, and the date is matched as
/// exactly eight characters so `abc` never matches the buckets of `abc:1`.
pub fn history_pattern(id: &str) -> String {
    format!("history:{}:????????", escape_glob(id))
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '*' | '?' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
