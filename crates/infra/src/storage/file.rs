use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError, StorageResult};

/// Directory-backed store: one `<key>.json` file per key.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a reader sees either the previous value or the new one.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    /// Open (creating if needed) the data directory.
    pub fn open(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!(
                "failed to create data directory {}: {e}",
                base_path.display()
            ))
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Io(format!("invalid storage key '{key}'")));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }

    fn stage(&self, key: &str, value: &str) -> StorageResult<(PathBuf, PathBuf)> {
        let target = self.path_for(key)?;
        let staged = target.with_extension("json.tmp");
        write_synced(&staged, value.as_bytes())?;
        Ok((staged, target))
    }
}

/// Write `data` to `path` and fsync it.
pub fn write_synced(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = fs::File::create(path)
        .map_err(|e| StorageError::Io(format!("failed to create {}: {e}", path.display())))?;
    file.write_all(data)
        .map_err(|e| StorageError::Io(format!("failed to write {}: {e}", path.display())))?;
    file.sync_all()
        .map_err(|e| StorageError::Io(format!("failed to sync {}: {e}", path.display())))?;
    Ok(())
}

/// Replace `path` with `data` via a temp file + rename.
pub fn write_replacing(path: &Path, data: &[u8]) -> StorageResult<()> {
    let staged = path.with_extension("tmp");
    write_synced(&staged, data)?;
    fs::rename(&staged, path).map_err(|e| {
        StorageError::Io(format!("failed to move {} into place: {e}", path.display()))
    })
}

/// Remove staged temp files that will not be renamed.
fn discard(staged: impl IntoIterator<Item = (PathBuf, PathBuf)>) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let (staged, target) = self.stage(key, value)?;
        fs::rename(&staged, &target).map_err(|e| {
            StorageError::Io(format!("failed to move {} into place: {e}", target.display()))
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }

    fn put_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        // Stage everything first; nothing becomes visible if any write fails.
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.stage(key, value) {
                Ok(paths) => staged.push(paths),
                Err(e) => {
                    discard(staged);
                    return Err(e);
                }
            }
        }

        let mut pending = staged.into_iter();
        while let Some((tmp, target)) = pending.next() {
            if let Err(e) = fs::rename(&tmp, &target) {
                let _ = fs::remove_file(&tmp);
                discard(pending);
                return Err(StorageError::Io(format!(
                    "failed to move {} into place: {e}",
                    target.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_basic_operations() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.get("customers").unwrap(), None);

        store.put("customers", "[]").unwrap();
        assert_eq!(store.get("customers").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data/customers.json").exists());
        assert!(!dir.path().join("data/customers.json.tmp").exists());

        store.remove("customers").unwrap();
        assert_eq!(store.get("customers").unwrap(), None);
        // Removing a missing key is not an error.
        store.remove("customers").unwrap();
    }

    #[test]
    fn put_many_writes_every_key() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();

        store
            .put_many(&[
                ("customers", "[\"c\"]".to_string()),
                ("transactions", "[\"t\"]".to_string()),
            ])
            .unwrap();

        assert_eq!(store.get("customers").unwrap().as_deref(), Some("[\"c\"]"));
        assert_eq!(
            store.get("transactions").unwrap().as_deref(),
            Some("[\"t\"]")
        );
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();

        assert!(store.put("../outside", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn write_replacing_overwrites_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.json");

        write_replacing(&path, b"first version, long").unwrap();
        write_replacing(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn failed_rename_leaves_no_staged_files() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();

        // A non-empty directory in the way makes the first rename fail.
        fs::create_dir_all(dir.path().join("customers.json/blocker")).unwrap();

        let err = store
            .put_many(&[
                ("customers", "[]".to_string()),
                ("transactions", "[]".to_string()),
            ])
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "leftover staged files: {leftovers:?}");
        assert_eq!(store.get("transactions").unwrap(), None);
    }
}
