use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let root = config::storage_root();
    let p = PathBuf::from(root);
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Relative path under the storage root for an event's proof photos:
/// `events/event_{event_id}/proofs/{filename}`
pub fn event_proof_rel(event_id: i64, filename: &str) -> String {
    format!("events/event_{event_id}/proofs/{filename}")
}

/// Relative path for an on-duty request's supporting document:
/// `onduty/request_{request_id}/{filename}` (request_id is the owning student's
/// id at creation time, since the row does not exist yet).
pub fn onduty_document_rel(student_id: i64, filename: &str) -> String {
    format!("onduty/student_{student_id}/documents/{filename}")
}

/// Relative path for an on-duty check-in selfie.
pub fn onduty_selfie_rel(request_id: i64, filename: &str) -> String {
    format!("onduty/request_{request_id}/selfies/{filename}")
}

/// Absolute filesystem path for a storage-relative path.
pub fn storage_path(rel: &str) -> PathBuf {
    storage_root().join(rel)
}

/// Retrievable URL for a storage-relative path, as served by the file route.
pub fn storage_url(rel: &str) -> String {
    format!("/files/{rel}")
}

/// Inverse of [`storage_url`]: the storage-relative path for a stored URL,
/// or `None` if the URL was not produced by this module.
pub fn rel_from_storage_url(url: &str) -> Option<&str> {
    url.strip_prefix("/files/")
}
