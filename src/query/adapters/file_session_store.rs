//! File-backed session store.
//!
//! The session identifier is stored as a small JSON document. Saves write a
//! temporary sibling, flush it to disk, rename it over the target and then
//! sync the directory, so a crash leaves either the old or the new value.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

use crate::query::{
    domain::SessionId,
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    session_id: SessionId,
}

/// Session store persisting to one file through a capability-scoped
/// directory handle.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: Arc<Dir>,
    file_name: String,
}

impl FileSessionStore {
    /// Opens a store writing to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Persistence`] when the path has no file
    /// name or its directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> SessionStoreResult<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            SessionStoreError::persistence(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("session path '{path}' has no file name"),
            ))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(SessionStoreError::persistence)?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(SessionStoreError::persistence)?;
        Ok(Self {
            dir: Arc::new(dir),
            file_name: file_name.to_owned(),
        })
    }

    fn temp_name(&self) -> String {
        format!(".{}.tmp", self.file_name)
    }

    async fn blocking<T, F>(&self, operation: F) -> SessionStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &str) -> SessionStoreResult<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();
        tokio::task::spawn_blocking(move || operation(&dir, &file_name))
            .await
            .map_err(|err| SessionStoreError::persistence(io::Error::other(err.to_string())))?
    }
}

fn write_durably(dir: &Dir, temp_name: &str, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut file = dir.create(temp_name)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    dir.rename(temp_name, dir, file_name)?;
    if let Err(err) = dir.open(".").and_then(|handle| handle.sync_all()) {
        debug!(error = %err, "session directory could not be synced");
    }
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> SessionStoreResult<Option<SessionId>> {
        self.blocking(|dir, file_name| match dir.read_to_string(file_name) {
            Ok(contents) => serde_json::from_str::<SessionRecord>(&contents)
                .map(|record| Some(record.session_id))
                .map_err(SessionStoreError::invalid_persisted_data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionStoreError::persistence(err)),
        })
        .await
    }

    async fn save(&self, session_id: &SessionId) -> SessionStoreResult<()> {
        let record = SessionRecord {
            session_id: session_id.clone(),
        };
        let contents = serde_json::to_vec(&record).map_err(SessionStoreError::persistence)?;
        let temp_name = self.temp_name();
        self.blocking(move |dir, file_name| {
            write_durably(dir, &temp_name, file_name, &contents)
                .map_err(SessionStoreError::persistence)
        })
        .await
    }

    async fn clear(&self) -> SessionStoreResult<()> {
        self.blocking(|dir, file_name| match dir.remove_file(file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStoreError::persistence(err)),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct StoreContext {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn context() -> StoreContext {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("temporary path should be UTF-8");
        StoreContext {
            path: root.join("state").join("session.json"),
            _temp: temp,
        }
    }

    fn session(value: &str) -> SessionId {
        SessionId::new(value).expect("valid session id")
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn load_missing_file_returns_none(context: StoreContext) {
        let store = FileSessionStore::open(&context.path).expect("store should open");

        let loaded = store.load().await.expect("load should succeed");

        assert_eq!(loaded, None);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn save_is_last_write_wins_and_survives_reopen(context: StoreContext) {
        let store = FileSessionStore::open(&context.path).expect("store should open");
        store.save(&session("first")).await.expect("save first");
        store.save(&session("second")).await.expect("save second");

        let reopened = FileSessionStore::open(&context.path).expect("store should reopen");
        let loaded = reopened.load().await.expect("load should succeed");

        assert_eq!(loaded, Some(session("second")));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn clear_removes_record_and_tolerates_missing_file(context: StoreContext) {
        let store = FileSessionStore::open(&context.path).expect("store should open");
        store.save(&session("abc")).await.expect("save");

        store.clear().await.expect("first clear");
        store.clear().await.expect("second clear");

        assert_eq!(store.load().await.expect("load"), None);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn corrupt_record_is_reported_as_invalid_data(context: StoreContext) {
        let parent = context.path.parent().expect("path has a parent");
        std::fs::create_dir_all(parent).expect("parent directory");
        std::fs::write(&context.path, "not json").expect("write corrupt record");
        let store = FileSessionStore::open(&context.path).expect("store should open");

        let result = store.load().await;

        assert!(matches!(
            result,
            Err(SessionStoreError::InvalidPersistedData(_))
        ));
    }
}
