//! Sled-backed user directory: one tree for user records, one for the
//! process-wide API credential. This is the only persistence boundary the
//! chat pipeline touches.

use crate::shared::{MindTribute, User};
use serde::Deserialize;
use sled::Db;
use std::path::Path;
use uuid::Uuid;

const DEFAULT_PATH: &str = "./data/mindmates_directory";

const USERS_TREE: &str = "users";
const CREDENTIAL_TREE: &str = "credential";

/// Key under which the single API credential is stored.
pub const CREDENTIAL_KEY: &str = "api_key";

/// Shape of the seed asset: `{ "users": [ ... ] }`, matching the original
/// bundled users.json.
#[derive(Deserialize)]
struct SeedFile {
    users: Vec<User>,
}

/// Durable directory of users plus the API credential store.
pub struct UserDirectory {
    db: Db,
}

impl UserDirectory {
    /// Opens or creates the directory DB at the default path.
    pub fn new() -> Result<Self, sled::Error> {
        Self::open_path(DEFAULT_PATH)
    }

    /// Opens or creates the directory DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Loads users from a seed JSON string, but only when the directory is
    /// still empty. Safe to call on every startup.
    pub fn seed_from_json(&self, json: &str) -> Result<usize, sled::Error> {
        let tree = self.db.open_tree(USERS_TREE)?;
        if !tree.is_empty() {
            return Ok(0);
        }
        let seed: SeedFile = match serde_json::from_str(json) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "mindmates::directory", error = %e, "seed file unreadable, starting empty");
                return Ok(0);
            }
        };
        let count = seed.users.len();
        for user in seed.users {
            tree.insert(user.id.as_bytes(), user.to_bytes())?;
        }
        tracing::info!(target: "mindmates::directory", count, "seeded user directory");
        Ok(count)
    }

    /// Creates and persists a new user with an empty support network.
    pub fn create_user(
        &self,
        name: &str,
        pronouns: &str,
        email: &str,
        password: &str,
    ) -> Result<User, sled::Error> {
        let user = User {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            pronouns: pronouns.to_string(),
            my_supporters: Vec::new(),
            supporting: Vec::new(),
            mind_tributes: None,
        };
        let tree = self.db.open_tree(USERS_TREE)?;
        tree.insert(user.id.as_bytes(), user.to_bytes())?;
        tracing::info!(
            target: "mindmates::directory",
            user_id = %user.id,
            "created user '{}'",
            user.name
        );
        Ok(user)
    }

    /// Returns the user with the given id, if present.
    pub fn get_user(&self, id: &str) -> Option<User> {
        let tree = self.db.open_tree(USERS_TREE).ok()?;
        tree.get(id.as_bytes())
            .ok()
            .flatten()
            .and_then(|b| User::from_bytes(&b))
    }

    /// Returns the user with the given email, if present.
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.all_users().into_iter().find(|u| u.email == email)
    }

    /// Returns all users. Order is not guaranteed.
    pub fn all_users(&self) -> Vec<User> {
        let tree = match self.db.open_tree(USERS_TREE) {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };
        tree.iter()
            .values()
            .filter_map(|v| v.ok())
            .filter_map(|b| User::from_bytes(&b))
            .collect()
    }

    /// Resolves the users supporting `user_id`. Dangling ids are skipped.
    pub fn supporters(&self, user_id: &str) -> Vec<User> {
        self.get_user(user_id)
            .map(|u| self.resolve_ids(&u.my_supporters))
            .unwrap_or_default()
    }

    /// Resolves the users `user_id` is supporting. Dangling ids are skipped.
    pub fn supporting(&self, user_id: &str) -> Vec<User> {
        self.get_user(user_id)
            .map(|u| self.resolve_ids(&u.supporting))
            .unwrap_or_default()
    }

    fn resolve_ids(&self, ids: &[String]) -> Vec<User> {
        ids.iter().filter_map(|id| self.get_user(id)).collect()
    }

    /// Returns the user's current tributes; empty when the user is absent
    /// or has had no successful chat turn yet.
    pub fn mind_tributes(&self, user_id: &str) -> Vec<MindTribute> {
        self.get_user(user_id)
            .and_then(|u| u.mind_tributes)
            .unwrap_or_default()
    }

    /// Wholesale-replaces the user's tribute set with the one from the
    /// latest successful turn. An unknown user id is a logged no-op: the
    /// chat reply must still reach the UI.
    pub fn replace_mind_tributes(
        &self,
        user_id: &str,
        tributes: Vec<MindTribute>,
    ) -> Result<(), sled::Error> {
        let tree = self.db.open_tree(USERS_TREE)?;
        let mut user = match tree.get(user_id.as_bytes())?.and_then(|b| User::from_bytes(&b)) {
            Some(u) => u,
            None => {
                tracing::warn!(
                    target: "mindmates::directory",
                    user_id = %user_id,
                    "tribute update skipped: user not found"
                );
                return Ok(());
            }
        };
        let count = tributes.len();
        user.mind_tributes = Some(tributes);
        tree.insert(user_id.as_bytes(), user.to_bytes())?;
        tracing::info!(
            target: "mindmates::directory",
            user_id = %user_id,
            tributes = count,
            "replaced mind tributes"
        );
        Ok(())
    }

    /// Returns the configured API credential, if one has been set.
    pub fn api_key(&self) -> Option<String> {
        let tree = self.db.open_tree(CREDENTIAL_TREE).ok()?;
        tree.get(CREDENTIAL_KEY.as_bytes())
            .ok()
            .flatten()
            .and_then(|b| String::from_utf8(b.to_vec()).ok())
            .filter(|s| !s.is_empty())
    }

    /// Persists the API credential so it survives restarts.
    pub fn set_api_key(&self, key: &str) -> Result<(), sled::Error> {
        let tree = self.db.open_tree(CREDENTIAL_TREE)?;
        tree.insert(CREDENTIAL_KEY.as_bytes(), key.as_bytes())?;
        tracing::info!(target: "mindmates::directory", "API credential updated");
        Ok(())
    }
}
