//! The key-addressed store holding attachment bytes outside the database.
//!
//! Keys look like `{org_id}/transactions/{transaction_id}/{nanos}-{name}`
//! and map directly onto a directory tree under the configured root. Only
//! the key is recorded in SQLite; the bytes never enter the relational
//! store.

use std::{
    fs,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::{Error, ids::{OrganizationId, TransactionId}};

/// A blob store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// A store rooted at `root`. The directory is created lazily on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build the storage key for a transaction attachment.
    ///
    /// The nanosecond timestamp keeps repeated uploads of the same
    /// filename from colliding.
    pub fn attachment_key(
        org_id: &OrganizationId,
        transaction_id: &TransactionId,
        file_name: &str,
    ) -> String {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let file_name = sanitize_file_name(file_name);

        format!("{org_id}/transactions/{transaction_id}/{nanos}-{file_name}")
    }

    /// Write `bytes` under `key`, creating parent directories as needed.
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| Error::StorageError(error.to_string()))?;
        }

        fs::write(&path, bytes).map_err(|error| Error::StorageError(error.to_string()))
    }

    /// Remove the object stored under `key`. Removing a missing key is an
    /// error: delete is only called to roll back a put that succeeded.
    pub fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;

        fs::remove_file(&path).map_err(|error| Error::StorageError(error.to_string()))
    }

    /// Whether an object exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).map(|path| path.is_file()).unwrap_or(false)
    }

    /// Resolve a key to a path inside the store root, rejecting keys that
    /// would escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        if key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
            return Err(Error::StorageError(format!("invalid storage key: {key}")));
        }

        Ok(self.root.join(Path::new(key)))
    }
}

/// Keep only the final path component of a client-supplied filename and
/// strip characters that have meaning to the filesystem.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    base.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}
