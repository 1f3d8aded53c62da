//! Cache key layout.
//!
//! ```text
//! {kind}:{id}               one record
//! {kind}:list:all           every record of a kind
//! {kind}:list:{query}       one search page
//! {kind}:_keys              tracking set of a kind's list keys
//! ```

use uuid::Uuid;

use crate::domain::EntityKind;

/// Topic every domain event is published on.
pub const DOMAIN_EVENTS_TOPIC: &str = "channel:domain-events";

/// Returns the cache key for a single record.
pub fn entity_key(kind: EntityKind, id: Uuid) -> String {
    format!("{}:{}", kind, id)
}

/// Returns the cache key for the full list of a kind.
pub fn entity_list_key(kind: EntityKind) -> String {
    format!("{}:list:all", kind)
}

/// Returns the cache key for one search page of a kind.
pub fn entity_query_key(kind: EntityKind, fingerprint: &str) -> String {
    format!("{}:list:{}", kind, fingerprint)
}

/// Returns the pattern matching every list and search key of a kind.
pub fn entity_lists_pattern(kind: EntityKind) -> String {
    format!("{}:list:*", kind)
}

/// Returns the key of the set tracking a kind's list keys.
///
/// Backends record every list key here on `set` so `delete_pattern` can
/// drop them without scanning the keyspace.
pub fn kind_tracking_key(kind: EntityKind) -> String {
    format!("{}:_keys", kind)
}

/// Extracts the entity kind a key or pattern belongs to.
///
/// Returns `None` for foreign keys and for patterns with a wildcard in the
/// kind position.
///
/// # Examples
///
/// ```
/// use standards_core::cache::extract_kind;
/// use standards_core::domain::EntityKind;
///
/// assert_eq!(extract_kind("room:list:all"), Some(EntityKind::Room));
/// assert_eq!(extract_kind("*:list:*"), None);
/// assert_eq!(extract_kind("session:abc"), None);
/// ```
pub fn extract_kind(key: &str) -> Option<EntityKind> {
    let prefix = key.split(':').next()?;
    EntityKind::ALL.into_iter().find(|k| k.as_str() == prefix)
}

/// Checks if a key is a list or search key (`"{kind}:list:..."`).
pub fn is_list_key(key: &str) -> bool {
    extract_kind(key).is_some_and(|kind| key.starts_with(&format!("{}:list:", kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::pattern_matches;

    #[test]
    fn test_entity_key() {
        assert_eq!(
            entity_key(EntityKind::Housing, Uuid::nil()),
            "housing:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_list_keys_match_lists_pattern() {
        let pattern = entity_lists_pattern(EntityKind::Room);
        assert!(pattern_matches(&pattern, &entity_list_key(EntityKind::Room)));
        assert!(pattern_matches(
            &pattern,
            &entity_query_key(EntityKind::Room, "page=1&page_size=20")
        ));
        assert!(!pattern_matches(&pattern, &entity_key(EntityKind::Room, Uuid::nil())));
        assert!(!pattern_matches(&pattern, &entity_list_key(EntityKind::Floor)));
    }

    #[test]
    fn test_extract_kind() {
        assert_eq!(
            extract_kind(&entity_key(EntityKind::CalibrationJournalItem, Uuid::nil())),
            Some(EntityKind::CalibrationJournalItem)
        );
        assert_eq!(extract_kind(&kind_tracking_key(EntityKind::Unit)), Some(EntityKind::Unit));
        assert_eq!(extract_kind(DOMAIN_EVENTS_TOPIC), None);
        assert_eq!(extract_kind(""), None);
    }

    #[test]
    fn test_is_list_key() {
        assert!(is_list_key(&entity_list_key(EntityKind::Grade)));
        assert!(is_list_key(&entity_query_key(EntityKind::Grade, "page=2")));
        assert!(!is_list_key(&entity_key(EntityKind::Grade, Uuid::nil())));
        assert!(!is_list_key(&kind_tracking_key(EntityKind::Grade)));
        assert!(!is_list_key("spaceship:list:all"));
    }
}
