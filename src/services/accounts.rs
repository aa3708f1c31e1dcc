use bcrypt::{hash, verify};
use chrono::Utc;

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult, StoreResult};
use crate::models::{User, UserProfile};
use crate::services::store::{
    read_collection, read_record, write_collection, write_record, Collection, SharedStore,
    SESSION_KEY, USERS_KEY,
};

/// Registration, login and the current-session pointer.
///
/// Users are unique by email. The session pointer is a single profile record
/// in the same store, so there is at most one signed-in user per store.
#[derive(Clone)]
pub struct AccountDirectory {
    store: SharedStore,
    bcrypt_cost: u32,
    min_password_length: usize,
}

impl AccountDirectory {
    pub fn new(store: SharedStore, auth: &AuthConfig) -> Self {
        Self {
            store,
            bcrypt_cost: auth.bcrypt_cost,
            min_password_length: auth.min_password_length,
        }
    }

    pub fn register(&self, email: &str, password: &str, name: &str) -> AppResult<UserProfile> {
        self.check_password_length(password, "/")?;
        let mut users = self.users()?;

        if email_taken(&users, email, None) {
            tracing::info!("Registration rejected, email already taken: {}", email);
            return Err(AppError::DuplicateAccount(email.to_string()));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: hash(password, self.bcrypt_cost)?,
            created_at: Utc::now(),
        };
        let profile = user.profile();

        users.push(user);
        write_collection(self.store.as_ref(), USERS_KEY, &users)?;
        self.set_session(&profile)?;

        tracing::info!("Registered user {} ({})", profile.id, profile.email);
        Ok(profile)
    }

    pub fn login(&self, email: &str, password: &str) -> AppResult<UserProfile> {
        let users = self.users()?;
        let user = users
            .records()
            .find(|u| u.email == email)
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))?;

        if !verify(password, &user.password_hash)? {
            tracing::info!("Invalid password for user: {}", email);
            return Err(AppError::InvalidCredentials);
        }

        let profile = user.profile();
        self.set_session(&profile)?;
        tracing::info!("User {} logged in", profile.id);
        Ok(profile)
    }

    pub fn logout(&self) -> StoreResult<()> {
        self.store.remove(SESSION_KEY)
    }

    /// The signed-in user, or `None` when no session is set or the session
    /// record cannot be read.
    pub fn current_user(&self) -> Option<UserProfile> {
        match read_record(self.store.as_ref(), SESSION_KEY) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to read session: {}", e);
                None
            }
        }
    }

    pub fn update_profile(&self, user_id: &str, name: &str, email: &str) -> AppResult<UserProfile> {
        let mut users = self.users()?;

        if email_taken(&users, email, Some(user_id)) {
            return Err(AppError::DuplicateAccount(email.to_string()));
        }

        let user = users
            .records_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
        user.name = name.to_string();
        user.email = email.to_string();
        let profile = user.profile();

        write_collection(self.store.as_ref(), USERS_KEY, &users)?;
        if self.current_user().is_some_and(|current| current.id == user_id) {
            self.set_session(&profile)?;
        }

        tracing::info!("Updated profile of user {}", user_id);
        Ok(profile)
    }

    pub fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> AppResult<()> {
        if new_password != confirm {
            return Err(AppError::validation("New passwords do not match!", "/settings"));
        }
        self.check_password_length(new_password, "/settings")?;

        let mut users = self.users()?;
        let user = users
            .records_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        if !verify(current, &user.password_hash)? {
            tracing::info!("Password change for user {} rejected, wrong current password", user_id);
            return Err(AppError::InvalidCredentials);
        }
        user.password_hash = hash(new_password, self.bcrypt_cost)?;

        write_collection(self.store.as_ref(), USERS_KEY, &users)?;
        tracing::info!("Changed password of user {}", user_id);
        Ok(())
    }

    fn users(&self) -> StoreResult<Collection<User>> {
        read_collection(self.store.as_ref(), USERS_KEY)
    }

    fn check_password_length(&self, password: &str, back_to: &'static str) -> AppResult<()> {
        if password.chars().count() < self.min_password_length {
            return Err(AppError::validation(
                format!(
                    "Password must be at least {} characters long!",
                    self.min_password_length
                ),
                back_to,
            ));
        }
        Ok(())
    }

    fn set_session(&self, profile: &UserProfile) -> StoreResult<()> {
        write_record(self.store.as_ref(), SESSION_KEY, profile)
    }
}

// Records that no longer decode as users still hold on to their email.
fn email_taken(users: &Collection<User>, email: &str, except_id: Option<&str>) -> bool {
    users
        .records()
        .any(|u| u.email == email && Some(u.id.as_str()) != except_id)
        || users
            .opaque()
            .any(|raw| raw.get("email").and_then(|e| e.as_str()) == Some(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{KvStore, MemoryStore};
    use std::sync::Arc;

    fn directory() -> (AccountDirectory, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::default());
        let auth = AuthConfig {
            bcrypt_cost: 4,
            min_password_length: 6,
        };
        (AccountDirectory::new(store.clone(), &auth), store)
    }

    #[test]
    fn register_sets_session_and_hides_hash() {
        let (accounts, store) = directory();
        let profile = accounts.register("ada@example.com", "secret1", "Ada").unwrap();

        assert_eq!(accounts.current_user(), Some(profile.clone()));
        let session = store.get(SESSION_KEY).unwrap().unwrap();
        assert!(!session.contains("passwordHash"));

        let users = store.get(USERS_KEY).unwrap().unwrap();
        assert!(!users.contains("secret1"));
    }

    #[test]
    fn duplicate_email_leaves_users_untouched() {
        let (accounts, store) = directory();
        accounts.register("ada@example.com", "secret1", "Ada").unwrap();
        let before = store.get(USERS_KEY).unwrap();

        let err = accounts.register("ada@example.com", "other99", "Imposter").unwrap_err();
        assert!(matches!(err, AppError::DuplicateAccount(_)));
        assert_eq!(store.get(USERS_KEY).unwrap(), before);
    }

    #[test]
    fn login_checks_email_then_password() {
        let (accounts, _) = directory();
        let registered = accounts.register("ada@example.com", "secret1", "Ada").unwrap();
        accounts.logout().unwrap();

        assert!(matches!(
            accounts.login("bob@example.com", "secret1"),
            Err(AppError::UserNotFound(_))
        ));
        assert!(matches!(
            accounts.login("ada@example.com", "wrong-password"),
            Err(AppError::InvalidCredentials)
        ));
        assert_eq!(accounts.current_user(), None);

        let profile = accounts.login("ada@example.com", "secret1").unwrap();
        assert_eq!(profile, registered);
        assert_eq!(accounts.current_user(), Some(registered));
    }

    #[test]
    fn malformed_session_reads_as_signed_out() {
        let (accounts, store) = directory();
        store.set(SESSION_KEY, "{\"id\": 7").unwrap();
        assert_eq!(accounts.current_user(), None);
    }

    #[test]
    fn logout_without_session_is_fine() {
        let (accounts, _) = directory();
        accounts.logout().unwrap();
        assert_eq!(accounts.current_user(), None);
    }

    #[test]
    fn profile_update_refreshes_session_and_guards_email() {
        let (accounts, _) = directory();
        let bob = accounts.register("bob@example.com", "secret1", "Bob").unwrap();
        let ada = accounts.register("ada@example.com", "secret1", "Ada").unwrap();

        let err = accounts
            .update_profile(&ada.id, "Ada", "bob@example.com")
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateAccount(_)));

        let updated = accounts
            .update_profile(&ada.id, "Ada Lovelace", "ada@lovelace.org")
            .unwrap();
        assert_eq!(accounts.current_user(), Some(updated));

        accounts.logout().unwrap();
        assert!(accounts.login("ada@lovelace.org", "secret1").is_ok());
        assert_eq!(accounts.login("bob@example.com", "secret1").unwrap().id, bob.id);
    }

    #[test]
    fn change_password_validates_input() {
        let (accounts, _) = directory();
        let ada = accounts.register("ada@example.com", "secret1", "Ada").unwrap();

        assert!(matches!(
            accounts.change_password(&ada.id, "secret1", "abcdef", "abcdeg"),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            accounts.change_password(&ada.id, "secret1", "abc", "abc"),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            accounts.change_password(&ada.id, "nope", "abcdef", "abcdef"),
            Err(AppError::InvalidCredentials)
        ));

        accounts.change_password(&ada.id, "secret1", "abcdef", "abcdef").unwrap();
        assert!(matches!(
            accounts.login("ada@example.com", "secret1"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(accounts.login("ada@example.com", "abcdef").is_ok());
    }

    #[test]
    fn register_enforces_minimum_password_length() {
        let (accounts, store) = directory();

        let err = accounts.register("ada@example.com", "abc", "Ada").unwrap_err();
        assert!(matches!(err, AppError::Validation { back_to: "/", .. }));
        assert_eq!(store.get(USERS_KEY).unwrap(), None);
        assert_eq!(accounts.current_user(), None);
    }

    #[test]
    fn legacy_user_records_survive_registration() {
        let (accounts, store) = directory();
        let legacy = serde_json::json!([
            {"id": "1", "email": "old@example.com", "name": "Old", "password": "plain"}
        ]);
        store.set(USERS_KEY, &legacy.to_string()).unwrap();

        assert!(matches!(
            accounts.register("old@example.com", "secret1", "Again"),
            Err(AppError::DuplicateAccount(_))
        ));
        accounts.register("ada@example.com", "secret1", "Ada").unwrap();

        let stored: Vec<serde_json::Value> =
            serde_json::from_str(&store.get(USERS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], legacy[0]);
    }
}
