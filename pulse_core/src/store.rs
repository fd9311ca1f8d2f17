//! User profiles and the active session.
//!
//! `UserStore` validates and persists profiles over any `UserRepository`.
//! There is no ambient "current user": callers hold a `Session` and pass it
//! to the operations that need it.

use crate::repository::UserRepository;
use crate::{Error, ProgressState, Result, User, UserSummary};
use chrono::Utc;
use uuid::Uuid;

/// Minimum username length, in characters, after trimming
pub const MIN_USERNAME_LEN: usize = 2;

/// The explicit active-user context: `none -> active(User) -> none`
#[derive(Clone, Debug, Default)]
pub struct Session {
    user: Option<User>,
    unsynced: bool,
}

impl Session {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn active(user: User) -> Self {
        Self {
            user: Some(user),
            unsynced: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.user.is_some()
    }

    /// True when the in-memory progress has changes the store failed to save
    pub fn is_unsynced(&self) -> bool {
        self.unsynced
    }

    /// Read-only view of the active user's progress
    pub fn progress(&self) -> Option<&ProgressState> {
        self.user.as_ref().map(|u| &u.progress_state)
    }

    fn user_mut(&mut self) -> Result<&mut User> {
        self.user
            .as_mut()
            .ok_or_else(|| Error::State("No user is logged in".into()))
    }

    fn clear(&mut self) {
        self.user = None;
        self.unsynced = false;
    }
}

fn normalize_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Username cannot be empty".into()));
    }
    if trimmed.chars().count() < MIN_USERNAME_LEN {
        return Err(Error::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    Ok(trimmed)
}

fn save_failed(action: &str, e: Error) -> Error {
    tracing::error!("Failed to {}: {}", action, e);
    Error::Persistence(format!("Failed to {}: {}", action, e))
}

/// Keyed collection of named profiles
pub struct UserStore<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Create a profile with a fresh default progress state
    ///
    /// The username is trimmed; it must be at least two characters and not
    /// already taken (exact, case-sensitive match).
    pub fn create_user(&mut self, username: &str) -> Result<User> {
        let username = normalize_username(username)?;

        let existing = self
            .repo
            .find_by_username(username)
            .map_err(|e| save_failed("load users", e))?;
        if existing.is_some() {
            return Err(Error::Duplicate("Username already exists".into()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: now,
            last_active_at: now,
            progress_state: ProgressState::default(),
        };

        self.repo.insert(&user).map_err(|e| match e {
            Error::Duplicate(_) => Error::Duplicate("Username already exists".into()),
            other => save_failed("create user", other),
        })?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Start a session for an existing profile
    ///
    /// Logging in counts as activity: `last_active_at` is stamped and saved.
    pub fn login_user(&mut self, username: &str) -> Result<Session> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Username cannot be empty".into()));
        }

        let mut user = self
            .repo
            .find_by_username(trimmed)
            .map_err(|e| save_failed("load users", e))?
            .ok_or_else(|| Error::NotFound("User not found".into()))?;

        self.update_user(&mut user)?;
        tracing::info!("Logged in as {}", user.username);
        Ok(Session::active(user))
    }

    /// Resume a session for a known id (e.g. one remembered between runs)
    pub fn resume(&self, id: Uuid) -> Result<Session> {
        let user = self
            .repo
            .get(id)
            .map_err(|e| save_failed("load user", e))?
            .ok_or_else(|| Error::NotFound("User not found".into()))?;
        Ok(Session::active(user))
    }

    /// End the session. Unsaved changes are not written.
    pub fn logout(&self, session: &mut Session) {
        if let Some(user) = session.user() {
            if session.is_unsynced() {
                tracing::warn!("Logging out {} with unsaved progress", user.username);
            }
            tracing::info!("Logged out {}", user.username);
        }
        session.clear();
    }

    /// Persist the whole record, stamping `last_active_at = now`
    pub fn update_user(&mut self, user: &mut User) -> Result<()> {
        user.last_active_at = Utc::now();
        self.repo
            .put(user)
            .map_err(|e| save_failed("save progress", e))
    }

    /// Apply a progress mutation to the active user, then save it
    ///
    /// If the mutation fails nothing changes. If only the save fails, the
    /// in-memory change is kept and the session is marked unsynced until the
    /// next successful save.
    pub fn apply<T, F>(&mut self, session: &mut Session, f: F) -> Result<T>
    where
        F: FnOnce(&mut ProgressState) -> Result<T>,
    {
        let user = session.user_mut()?;
        let mut progress = user.progress_state.clone();
        let value = f(&mut progress)?;
        user.progress_state = progress;

        match self.update_user(user) {
            Ok(()) => {
                session.unsynced = false;
                Ok(value)
            }
            Err(e) => {
                session.unsynced = true;
                Err(e)
            }
        }
    }

    /// Retry saving the active user's in-memory state
    pub fn sync(&mut self, session: &mut Session) -> Result<()> {
        self.apply(session, |_| Ok(()))
    }

    /// Permanently remove a profile, ending the session if it was active
    pub fn delete_user(&mut self, session: &mut Session, id: Uuid) -> Result<()> {
        let removed = self
            .repo
            .delete(id)
            .map_err(|e| save_failed("delete user", e))?;
        if !removed {
            return Err(Error::NotFound("User not found".into()));
        }

        if session.user().map(|u| u.id) == Some(id) {
            session.clear();
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Look up a profile by username without starting a session
    pub fn find_user(&self, username: &str) -> Result<User> {
        self.repo
            .find_by_username(username.trim())
            .map_err(|e| save_failed("load users", e))?
            .ok_or_else(|| Error::NotFound("User not found".into()))
    }

    /// Every profile, most recently active first
    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        let mut summaries: Vec<UserSummary> = self
            .repo
            .all()
            .map_err(|e| save_failed("load users", e))?
            .iter()
            .map(UserSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(summaries)
    }
}
