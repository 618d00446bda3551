use anyhow::{Context, Result};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "local_storage.json";

/// A string key/value store persisted as one JSON file, scoped to a single
/// client installation. Values are opaque strings; callers serialize.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Opens (creating if needed) the storage kept under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Could not create storage directory {}", dir.display()))?;

        Ok(Self { path: dir.join(STORAGE_FILE) })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid storage file", self.path.display()))
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        // Write next to the target and rename, so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(items)?)
            .with_context(|| format!("Could not write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Could not replace {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();

        let storage = LocalStorage::open(dir.path()).unwrap();
        storage.set_item("theme", "dark").unwrap();
        storage.set_item("learningStreak", "{}").unwrap();

        let reopened = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get_item("missing").unwrap(), None);
    }
}
