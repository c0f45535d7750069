//! Shared object-key generation for storage backends.
//!
//! Canonical key format: `tenant/{tenant_id}/cat_{category}/subcat_{sub_category}/class_{classification}/{filename}`.
//! The key is deterministic from tenant + folder taxonomy + filename and is the
//! only linkage between a file record and its binary payload.

use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Generate the canonical object key for a file.
///
/// All backends and callers must use this format so a record's taxonomy always
/// resolves to exactly one bucket location.
pub fn object_key(
    tenant_id: Uuid,
    category: i64,
    sub_category: i64,
    classification: i64,
    filename: &str,
) -> String {
    format!(
        "tenant/{}/cat_{}/subcat_{}/class_{}/{}",
        tenant_id, category, sub_category, classification, filename
    )
}

/// Whether a key was produced by [`object_key`]. Keys from before the key
/// format was settled fail this check and may need [`find_matching_key`]
/// when a direct read misses.
pub fn is_canonical_key(object_key: &str) -> bool {
    object_key.starts_with("tenant/")
}

/// Reject keys that could escape the bucket namespace.
pub fn validate_key(object_key: &str) -> StorageResult<()> {
    if object_key.is_empty() || object_key.contains("..") || object_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Object key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Legacy-migration fallback: first key in the listing containing
/// `partial_key` as a substring, or `None`.
///
/// Pre-canonical records carry loose keys (`ten_{tenant}/cat_{c}/...`) that
/// cannot be rebuilt from their metadata, so they are resolved by scanning an
/// enumeration of the bucket. First match wins and is ambiguous when several
/// keys share the substring; never use this on the primary lookup path.
pub fn find_matching_key<'a>(key_listing: &'a [String], partial_key: &str) -> Option<&'a str> {
    if partial_key.is_empty() {
        return None;
    }
    key_listing
        .iter()
        .find(|key| key.contains(partial_key))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_deterministic_and_hierarchical() {
        let tenant_id = Uuid::nil();
        let key = object_key(tenant_id, 2, 3, 5, "a.pdf");
        assert_eq!(
            key,
            "tenant/00000000-0000-0000-0000-000000000000/cat_2/subcat_3/class_5/a.pdf"
        );
        assert_eq!(key, object_key(tenant_id, 2, 3, 5, "a.pdf"));
    }

    #[test]
    fn canonical_check_separates_legacy_keys() {
        assert!(is_canonical_key(
            "tenant/00000000-0000-0000-0000-000000000000/cat_2/subcat_3/class_5/a.pdf"
        ));
        assert!(!is_canonical_key("ten_abc/cat_2/class_5/a.pdf"));
    }

    #[test]
    fn validate_key_rejects_traversal_and_absolute_paths() {
        assert!(validate_key("tenant/t/cat_1/subcat_1/class_1/a.pdf").is_ok());
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("/etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn find_matching_key_returns_first_substring_match() {
        let listing = vec![
            "ten_abc/cat_2/class_5/report.pdf".to_string(),
            "ten_abc/cat_2/class_5/report-final.pdf".to_string(),
        ];

        assert_eq!(
            find_matching_key(&listing, "report.pdf"),
            Some("ten_abc/cat_2/class_5/report.pdf")
        );
        // First match wins even when several keys contain the fragment.
        assert_eq!(
            find_matching_key(&listing, "report"),
            Some("ten_abc/cat_2/class_5/report.pdf")
        );
        assert_eq!(find_matching_key(&listing, "missing.doc"), None);
        assert_eq!(find_matching_key(&listing, ""), None);
    }
}
