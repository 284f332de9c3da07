//! File-handle storage collaborator.
//!
//! Accepts binary payloads (payment proofs, speaker photos, sponsor logos,
//! hero media) and returns an opaque handle string; the rest of the system
//! stores only the handle. Backed by a local directory here, but nothing
//! outside this module assumes that.

use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Date-prefixed short id, also used as the public submission reference.
pub fn generate_reference() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4().to_string()[..8].to_string()
    )
}

pub fn ensure_dirs(upload_folder: &PathBuf) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)?;
    Ok(())
}

/// Store a payload and return its handle.
pub fn store_file(
    upload_folder: &Path,
    original_name: &str,
    data: &[u8],
) -> std::io::Result<String> {
    let name = sanitize_name(original_name);
    let handle = format!("{}_{}", generate_reference(), name);
    std::fs::write(upload_folder.join(&handle), data)?;
    Ok(handle)
}

/// Resolve a handle back to a path, or None for unknown or malformed
/// handles. Rejects anything that could traverse out of the upload folder.
pub fn resolve(upload_folder: &Path, handle: &str) -> Option<PathBuf> {
    if handle.is_empty() || handle.contains("..") || handle.contains('/') || handle.contains('\\') {
        return None;
    }
    let path = upload_folder.join(handle);
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn sanitize_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let reference = generate_reference();
        let (date, id) = reference.split_once('_').unwrap();
        assert_eq!(date.len(), 8);
        assert_eq!(id.len(), 8);
    }

    #[test]
    fn test_sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("my receipt (1).pdf"), "my_receipt__1_.pdf");
        assert_eq!(sanitize_name(""), "file");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = PathBuf::from("/tmp/uploads");
        assert!(resolve(&dir, "../secret").is_none());
        assert!(resolve(&dir, "a/b").is_none());
        assert!(resolve(&dir, "").is_none());
    }
}
