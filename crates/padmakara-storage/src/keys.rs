//! Key checks shared by the backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the bucket root or address a folder.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.starts_with('/') || storage_key.ends_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must not start or end with '/': {}",
            storage_key
        )));
    }
    if storage_key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains an invalid segment: {}",
            storage_key
        )));
    }
    Ok(())
}

/// Folder prefix without its trailing slash. An empty prefix is rejected,
/// since listing it would return every object in the bucket.
pub fn validate_prefix(prefix: &str) -> StorageResult<&str> {
    let trimmed = prefix.trim_end_matches('/');
    validate_key(trimmed).map_err(|_| {
        StorageError::InvalidKey(format!("Invalid folder prefix: {:?}", prefix))
    })?;
    Ok(trimmed)
}

/// Prefix in listing form, with exactly one trailing slash.
pub fn list_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

/// Folder prefixes holding `storage_key`, deepest first.
pub fn parent_prefixes(storage_key: &str) -> impl Iterator<Item = &str> {
    storage_key
        .rmatch_indices('/')
        .map(move |(idx, _)| &storage_key[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_key_rejects_traversal() {
        assert!(validate_key("Retreat/Day 1/01.mp3").is_ok());
        for key in ["", "/etc/passwd", "a/../b", "a//b", "folder/", "./a"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[test]
    fn validate_prefix_rejects_bucket_root() {
        assert_eq!(validate_prefix("Retreat/Day 1/").unwrap(), "Retreat/Day 1");
        for prefix in ["", "/", "//", "a/../b", "/Retreat"] {
            assert!(
                matches!(validate_prefix(prefix), Err(StorageError::InvalidKey(_))),
                "{prefix:?}"
            );
        }
    }

    #[test]
    fn list_prefix_has_single_trailing_slash() {
        assert_eq!(list_prefix("Retreat/Day 1"), "Retreat/Day 1/");
        assert_eq!(list_prefix("Retreat/"), "Retreat/");
    }

    #[test]
    fn parent_prefixes_deepest_first() {
        let prefixes: Vec<_> = parent_prefixes("a/b/c.mp3").collect();
        assert_eq!(prefixes, vec!["a/b", "a"]);
    }
}
