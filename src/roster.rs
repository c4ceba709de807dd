//! Roster string codec.
//!
//! The identity store holds the followed-club list as a single string
//! attribute: club ids comma-joined, with the sentinel `"No Clubs"` standing
//! in for an empty list (the store rejects empty attribute values).
//!
//! Parsing is forgiving: entries are trimmed, empty segments are dropped,
//! and duplicates are removed keeping the first occurrence. Ids are not
//! validated beyond that — a stale id is harmless because the filtered views
//! intersect with the directory snapshot before anything reaches the UI.

/// Attribute value meaning "the user follows no clubs".
pub const EMPTY_ROSTER_SENTINEL: &str = "No Clubs";

/// Parse a roster attribute value into an ordered, deduplicated id list.
pub fn parse_roster(value: &str) -> Vec<String> {
    if value.trim() == EMPTY_ROSTER_SENTINEL {
        return Vec::new();
    }

    let mut ids: Vec<String> = Vec::new();
    for part in value.split(',') {
        let id = part.trim();
        if id.is_empty() {
            continue;
        }
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Serialize an id list back to the attribute value.
///
/// An empty roster serializes to the sentinel, never to an empty string.
pub fn serialize_roster<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = ids
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",");

    if joined.is_empty() {
        EMPTY_ROSTER_SENTINEL.to_string()
    } else {
        joined
    }
}

// ============================================================================
// TESTS
// ============================================================================
