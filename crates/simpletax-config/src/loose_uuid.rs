//! Loose UUID matching and conversion.
//!
//! Account identifiers come from paths and query strings as five
//! hyphen-separated groups of word characters. That shape is deliberately
//! more permissive than RFC 4122 so that legacy identifiers still route;
//! conversion to a real [`Uuid`] is a separate, stricter step.

use std::sync::LazyLock;

use regex_lite::Regex;
use uuid::Uuid;

/// Five hyphen-separated groups of ASCII word characters.
pub const UUID_LOOSE_PATTERN: &str = r"\w+-\w+-\w+-\w+-\w+";

/// Maximum number of hex digits in each group of a UUID.
const GROUP_WIDTHS: [usize; 5] = [8, 4, 4, 4, 12];

static LOOSE_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{UUID_LOOSE_PATTERN}$")).expect("loose UUID pattern is valid")
});

/// Whether `s` has the loose UUID shape.
pub fn is_loose_uuid(s: &str) -> bool {
    LOOSE_UUID.is_match(s)
}

/// Convert a loosely formatted identifier to a [`Uuid`].
///
/// Each group must hold between one and its full width of hex digits;
/// shorter groups are zero-padded on the left, so `1-2-3-4-5` converts to
/// `00000001-0002-0003-0004-000000000005`. Returns `None` for anything else.
pub fn to_uuid_or_none(s: &str) -> Option<Uuid> {
    let groups: Vec<&str> = s.split('-').collect();
    if groups.len() != GROUP_WIDTHS.len() {
        return None;
    }

    let mut canonical = String::with_capacity(36);
    for (i, (group, width)) in groups.iter().zip(GROUP_WIDTHS).enumerate() {
        if group.is_empty()
            || group.len() > width
            || !group.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }
        if i > 0 {
            canonical.push('-');
        }
        canonical.extend(std::iter::repeat('0').take(width - group.len()));
        canonical.push_str(group);
    }

    Uuid::parse_str(&canonical).ok()
}

/// Match the loose shape first, then convert.
pub fn parse_loose(s: &str) -> Option<Uuid> {
    if is_loose_uuid(s) {
        to_uuid_or_none(s)
    } else {
        None
    }
}
