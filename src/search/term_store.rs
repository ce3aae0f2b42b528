//! Keeps the search term across restarts. Only the last term is stored.

use std::{
    fs::File,
    io::{BufReader, ErrorKind, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const STATE_FILE: &str = "state.json";

#[cfg_attr(test, mockall::automock)]
pub trait SearchTermStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, term: &str) -> Result<()>;
}

/// Store living only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTermStore {
    term: Mutex<Option<String>>,
}

impl MemoryTermStore {
    pub fn new(term: Option<String>) -> Self {
        Self {
            term: Mutex::new(term),
        }
    }
}

impl SearchTermStore for MemoryTermStore {
    fn load(&self) -> Result<Option<String>> {
        let term = self
            .term
            .lock()
            .map_err(|_| anyhow!("Search term store is poisoned"))?;
        Ok(term.clone())
    }

    fn save(&self, term: &str) -> Result<()> {
        let mut stored = self
            .term
            .lock()
            .map_err(|_| anyhow!("Search term store is poisoned"))?;
        *stored = Some(term.to_owned());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedState {
    #[serde(default)]
    search_term: Option<String>,
}

/// Stores the term as json inside the application directory. Several processes might share the
/// directory, so the file is locked while it's used.
pub struct FileTermStore {
    path: PathBuf,
}

impl FileTermStore {
    pub fn new(application_dir: &Path) -> Self {
        Self {
            path: application_dir.join(STATE_FILE),
        }
    }

    fn write_state(file: &mut File, state: &SavedState) -> Result<()> {
        // Truncated under the lock, readers never see a partial file.
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        serde_json::to_writer(&mut *file, state)?;
        file.flush()?;
        Ok(())
    }
}

impl SearchTermStore for FileTermStore {
    fn load(&self) -> Result<Option<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file)?;
        let state = serde_json::from_reader::<_, SavedState>(BufReader::new(&file));
        FileExt::unlock(&file)?;
        let state = state?;
        debug!("Restored search term {:?}", state.search_term);
        Ok(state.search_term)
    }

    fn save(&self, term: &str) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        let result = Self::write_state(
            &mut file,
            &SavedState {
                search_term: Some(term.to_owned()),
            },
        );
        FileExt::unlock(&file)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{FileTermStore, MemoryTermStore, SearchTermStore, STATE_FILE};

    #[test]
    fn memory_store_keeps_last_term() -> Result<()> {
        let store = MemoryTermStore::default();
        assert_eq!(store.load()?, None);

        store.save("ma")?;
        store.save("mail")?;

        assert_eq!(store.load()?, Some("mail".into()));
        Ok(())
    }

    #[test]
    fn file_store_round_trips_between_instances() -> Result<()> {
        let dir = tempdir()?;

        FileTermStore::new(dir.path()).save("a much longer term")?;
        FileTermStore::new(dir.path()).save("short")?;

        assert_eq!(FileTermStore::new(dir.path()).load()?, Some("short".into()));
        Ok(())
    }

    #[test]
    fn file_store_without_file_is_empty() -> Result<()> {
        let dir = tempdir()?;

        assert_eq!(FileTermStore::new(dir.path()).load()?, None);
        Ok(())
    }

    #[test]
    fn file_store_rejects_broken_state() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(STATE_FILE), "{")?;

        assert!(FileTermStore::new(dir.path()).load().is_err());
        Ok(())
    }
}
