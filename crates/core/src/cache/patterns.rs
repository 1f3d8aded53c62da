//! Glob matching for cache keys. `*` matches any run of characters,
//! including none; every other character matches itself.

/// Checks if a cache key matches a glob pattern.
///
/// # Examples
///
/// ```
/// use standards_core::cache::pattern_matches;
///
/// assert!(pattern_matches("room:list:*", "room:list:all"));
/// assert!(pattern_matches("*:list:*", "floor:list:page=1"));
/// assert!(!pattern_matches("room:list:*", "room:00000000-0000-0000-0000-000000000000"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    // `split` always yields at least one item.
    let head = parts.next().unwrap_or_default();
    let Some(mut rest) = key.strip_prefix(head) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
