/// Signup and credential checks
///
/// The enabled-state gate comes before the password check: a pending
/// account gets `AccountNotEnabled` whether or not the password is right.

use std::sync::Arc;

use tracing::{debug, info};

use super::password::PasswordHasher;
use super::verification::{NewAccount, VerificationEngine};
use crate::error::{DomainError, DomainResult};
use crate::models::user::User;
use crate::store::Store;

pub struct Authenticator {
    store: Arc<dyn Store>,
    hasher: Arc<dyn PasswordHasher>,
    verification: Arc<VerificationEngine>,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn PasswordHasher>,
        verification: Arc<VerificationEngine>,
    ) -> Self {
        Self {
            store,
            hasher,
            verification,
        }
    }

    /// Registers a pending account and emails its verification code
    ///
    /// # Errors
    ///
    /// - `EmailAlreadyRegistered` if the email is taken
    /// - `NotificationFailure` if the code could not be emailed
    #[tracing::instrument(skip(self, raw_password))]
    pub async fn signup(&self, username: &str, email: &str, raw_password: &str) -> DomainResult<User> {
        // Cheap check before paying for a hash
        let mut tx = self.store.begin().await?;
        if tx.find_user_by_email(email).await?.is_some() {
            debug!("Signup rejected, email already registered");
            return Err(DomainError::EmailAlreadyRegistered);
        }
        drop(tx);

        let password_hash = self.hasher.hash(raw_password)?;

        self.verification
            .issue_verification(NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
    }

    /// Checks an email/password pair
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the email is unknown
    /// - `AccountNotEnabled` if the account is not verified yet
    /// - `InvalidCredentials` if the password does not match
    #[tracing::instrument(skip(self, raw_password))]
    pub async fn authenticate(&self, email: &str, raw_password: &str) -> DomainResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))?;
        drop(tx);

        if !user.enabled {
            debug!(user_id = user.id, "Login rejected, account not verified");
            return Err(DomainError::AccountNotEnabled);
        }

        if !self.hasher.matches(raw_password, &user.password_hash)? {
            debug!(user_id = user.id, "Login rejected, wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        info!(user_id = user.id, "User authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2Hasher;
    use crate::clock::SystemClock;
    use crate::notify::recording::RecordingNotifier;
    use crate::store::memory::MemoryStore;

    struct Harness {
        notifier: Arc<RecordingNotifier>,
        verification: Arc<VerificationEngine>,
        authenticator: Authenticator,
    }

    fn harness() -> Harness {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let verification = Arc::new(VerificationEngine::new(
            store.clone(),
            notifier.clone(),
            Arc::new(SystemClock),
        ));
        let hasher = Arc::new(Argon2Hasher::new(1024, 1, 1).unwrap());
        let authenticator = Authenticator::new(store, hasher, verification.clone());

        Harness {
            notifier,
            verification,
            authenticator,
        }
    }

    #[tokio::test]
    async fn test_signup_hashes_password() {
        let h = harness();
        let user = h
            .authenticator
            .signup("alice", "a@x.com", "password123")
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(!user.enabled);
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_ne!(user.password_hash, "password123");
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let h = harness();
        h.authenticator.signup("alice", "a@x.com", "password123").await.unwrap();

        let result = h.authenticator.signup("alice2", "a@x.com", "password456").await;
        assert!(matches!(result, Err(DomainError::EmailAlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_disabled_account_rejected_even_with_correct_password() {
        let h = harness();
        h.authenticator.signup("alice", "a@x.com", "password123").await.unwrap();

        let result = h.authenticator.authenticate("a@x.com", "password123").await;
        assert!(matches!(result, Err(DomainError::AccountNotEnabled)));

        let result = h.authenticator.authenticate("a@x.com", "wrong-password").await;
        assert!(matches!(result, Err(DomainError::AccountNotEnabled)));
    }

    #[tokio::test]
    async fn test_authenticate_after_verification() {
        let h = harness();
        let user = h
            .authenticator
            .signup("alice", "a@x.com", "password123")
            .await
            .unwrap();
        h.verification
            .verify(user.verification_code.as_deref().unwrap())
            .await
            .unwrap();

        let authed = h.authenticator.authenticate("a@x.com", "password123").await.unwrap();
        assert_eq!(authed.id, user.id);

        let wrong = h.authenticator.authenticate("a@x.com", "password124").await;
        assert!(matches!(wrong, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let h = harness();
        let result = h.authenticator.authenticate("nobody@x.com", "password123").await;
        assert!(matches!(result, Err(DomainError::UserNotFound(_))));
    }
}
