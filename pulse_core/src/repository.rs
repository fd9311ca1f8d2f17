//! User record persistence with file locking.
//!
//! Each user is stored as one JSON document under `<data_dir>/users/`,
//! keyed by id. Every save rewrites the whole record atomically; usernames
//! form a unique secondary index enforced on insert.

use crate::{Error, Result, User};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Version stamped on every stored record
pub const RECORD_VERSION: u32 = 1;

/// Keyed store of user records
pub trait UserRepository {
    /// Add a new record. Fails with `Error::Duplicate` if the id or the
    /// username is already present, and never admits a username that an
    /// existing record might hold.
    fn insert(&mut self, user: &User) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Exact, case-sensitive match on the stored username
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Replace an existing record
    fn put(&mut self, user: &User) -> Result<()>;

    /// Remove a record. Returns false if there was nothing to remove.
    fn delete(&mut self, id: Uuid) -> Result<bool>;

    fn all(&self) -> Result<Vec<User>>;
}

fn duplicate_username(username: &str) -> Error {
    Error::Duplicate(format!("Username '{}' already exists", username))
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Persistence(format!(
        "Cannot check username against unreadable record {:?}: {}",
        path, e
    ))
}

// ============================================================================
// JSON files
// ============================================================================

#[derive(Serialize)]
struct StoredUserRef<'a> {
    version: u32,
    user: &'a User,
}

#[derive(Deserialize)]
struct StoredUser {
    version: u32,
    user: User,
}

/// Just enough of a record, of any version, to read its username
#[derive(Deserialize)]
struct StoredUsername {
    user: UsernameOnly,
}

#[derive(Deserialize)]
struct UsernameOnly {
    username: String,
}

/// One JSON file per user, guarded by `fs2` locks
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Open (creating if needed) the `users/` directory under `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("users");
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Opened user repository at {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Exclusive lock over the whole directory, held while the username
    /// index is checked and a new record written
    fn lock_index(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.dir.join(".lock"))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read_contents(path: &Path) -> Result<String> {
        let file = File::open(path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;
        Ok(contents)
    }

    fn read_record(path: &Path) -> Result<User> {
        let contents = Self::read_contents(path)?;
        let stored: StoredUser = serde_json::from_str(&contents)?;
        if stored.version != RECORD_VERSION {
            return Err(Error::Persistence(format!(
                "Record {:?} has unsupported version {}",
                path, stored.version
            )));
        }
        Ok(stored.user)
    }

    /// Atomically writes a record by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn write_record(&self, user: &User) -> Result<()> {
        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(&StoredUserRef {
                version: RECORD_VERSION,
                user,
            })?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        let path = self.record_path(user.id);
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user {} to {:?}", user.username, path);
        Ok(())
    }

    /// Strict scan of every record for `username`
    ///
    /// Unlike `all()`, a record that cannot be read is an error: its
    /// username is unknown, so the name cannot be proven free.
    fn username_taken(&self, username: &str) -> Result<bool> {
        for path in self.record_paths()? {
            let contents = Self::read_contents(&path).map_err(|e| unreadable(&path, e))?;
            let stored: StoredUsername =
                serde_json::from_str(&contents).map_err(|e| unreadable(&path, e))?;
            if stored.user.username == username {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl UserRepository for JsonFileRepository {
    fn insert(&mut self, user: &User) -> Result<()> {
        let lock = self.lock_index()?;

        let result = if self.record_path(user.id).exists() {
            Err(Error::Duplicate(format!("User id {} already exists", user.id)))
        } else {
            match self.username_taken(&user.username) {
                Ok(true) => Err(duplicate_username(&user.username)),
                Ok(false) => self.write_record(user),
                Err(e) => Err(e),
            }
        };

        lock.unlock()?;
        result
    }

    fn get(&self, id: Uuid) -> Result<Option<User>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.all()?.into_iter().find(|u| u.username == username))
    }

    fn put(&mut self, user: &User) -> Result<()> {
        self.write_record(user)
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        tracing::debug!("Removed user record {:?}", path);
        Ok(true)
    }

    /// Unreadable records are logged and skipped.
    fn all(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();
        for path in self.record_paths()? {
            match Self::read_record(&path) {
                Ok(user) => users.push(user),
                Err(e) => {
                    tracing::warn!("Skipping unreadable user record {:?}: {}", path, e);
                }
            }
        }
        Ok(users)
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Non-durable repository for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryRepository {
    users: BTreeMap<Uuid, User>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryRepository {
    fn insert(&mut self, user: &User) -> Result<()> {
        if self.users.contains_key(&user.id) {
            return Err(Error::Duplicate(format!("User id {} already exists", user.id)));
        }
        if self.users.values().any(|u| u.username == user.username) {
            return Err(duplicate_username(&user.username));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.values().find(|u| u.username == username).cloned())
    }

    fn put(&mut self, user: &User) -> Result<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.users.remove(&id).is_some())
    }

    fn all(&self) -> Result<Vec<User>> {
        Ok(self.users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressState;
    use chrono::Utc;

    fn test_user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.into(),
            created_at: Utc::now(),
            last_active_at: Utc::now(),
            progress_state: ProgressState::default(),
        }
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let user = test_user("alice");

        repo.insert(&user).unwrap();

        let loaded = repo.get(user.id).unwrap().unwrap();
        assert_eq!(loaded, user);
        assert!(temp_dir
            .path()
            .join("users")
            .join(format!("{}.json", user.id))
            .exists());
    }

    #[test]
    fn test_unique_username_index() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();

        repo.insert(&test_user("alice")).unwrap();
        let result = repo.insert(&test_user("alice"));

        assert!(matches!(result, Err(Error::Duplicate(_))));
        assert_eq!(repo.all().unwrap().len(), 1);
    }

    #[test]
    fn test_username_match_is_case_sensitive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        repo.insert(&test_user("Alice")).unwrap();

        assert!(repo.find_by_username("alice").unwrap().is_none());
        assert!(repo.find_by_username("Alice").unwrap().is_some());
    }

    #[test]
    fn test_put_replaces_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let mut user = test_user("bob");
        repo.insert(&user).unwrap();

        user.progress_state.log_cardio(30.0, None);
        repo.put(&user).unwrap();

        let loaded = repo.get(user.id).unwrap().unwrap();
        assert_eq!(loaded.progress_state.xp, 30);
        assert_eq!(repo.all().unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let user = test_user("carol");
        repo.insert(&user).unwrap();

        assert!(repo.delete(user.id).unwrap());
        assert!(!repo.delete(user.id).unwrap());
        assert!(repo.get(user.id).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_record_skipped_in_listing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        repo.insert(&test_user("dave")).unwrap();

        std::fs::write(repo.dir().join("broken.json"), "{ invalid json }").unwrap();

        let users = repo.all().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "dave");
    }

    #[test]
    fn test_unsupported_version_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let user = test_user("erin");
        let doc = serde_json::json!({ "version": 99, "user": user });
        std::fs::write(
            repo.dir().join(format!("{}.json", user.id)),
            doc.to_string(),
        )
        .unwrap();

        assert!(matches!(repo.get(user.id), Err(Error::Persistence(_))));
        assert!(repo.all().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_record_still_reserves_username() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let user = test_user("alice");
        repo.insert(&user).unwrap();

        let path = repo.dir().join(format!("{}.json", user.id));
        let original = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, original.replacen("\"version\":1", "\"version\":2", 1)).unwrap();
        assert!(repo.find_by_username("alice").unwrap().is_none());

        let result = repo.insert(&test_user("alice"));
        assert!(matches!(result, Err(Error::Duplicate(_))));

        // Once the record reads again there is still exactly one alice
        std::fs::write(&path, original).unwrap();
        let names: Vec<_> = repo.all().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice".to_string()]);
    }

    #[test]
    fn test_insert_fails_closed_on_corrupted_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        repo.insert(&test_user("dave")).unwrap();

        std::fs::write(repo.dir().join("broken.json"), "{\"version\":1,\"user\":{\"id\"").unwrap();

        let result = repo.insert(&test_user("erin"));
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert!(repo.find_by_username("erin").unwrap().is_none());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::open(temp_dir.path()).unwrap();
        let user = test_user("frank");
        repo.insert(&user).unwrap();
        repo.put(&user).unwrap();

        let extras: Vec<_> = std::fs::read_dir(repo.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != ".lock" && *name != format!("{}.json", user.id))
            .collect();
        assert!(extras.is_empty(), "Unexpected files: {:?}", extras);
    }

    #[test]
    fn test_memory_repository_matches_contract() {
        let mut repo = MemoryRepository::new();
        let user = test_user("gina");

        repo.insert(&user).unwrap();
        assert!(matches!(
            repo.insert(&test_user("gina")),
            Err(Error::Duplicate(_))
        ));
        assert_eq!(repo.find_by_username("gina").unwrap().unwrap().id, user.id);
        assert!(repo.delete(user.id).unwrap());
        assert!(repo.all().unwrap().is_empty());
    }
}
