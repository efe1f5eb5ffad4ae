/// Account verification by emailed one-time code
///
/// # Flow
///
/// 1. Signup or resend produces a [`VerificationTicket`]: a 6-digit code and
///    an expiration `code_ttl` from now (15 minutes by default)
/// 2. The code is emailed through the [`Notifier`]
/// 3. Only after the email went out is the ticket written to the store
/// 4. [`VerificationEngine::verify`] enables the account if the code is known
///    and not past its expiration
///
/// No store transaction is open while the email is sent. The account state
/// is checked once before sending and again in the transaction that writes
/// the ticket, so a concurrent change between the two is detected rather
/// than overwritten.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_shared::auth::verification::{NewAccount, VerificationEngine};
/// use todolist_shared::clock::SystemClock;
/// use todolist_shared::notify::log::LogNotifier;
/// use todolist_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = VerificationEngine::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(LogNotifier::new()),
///     Arc::new(SystemClock),
/// );
///
/// let user = engine
///     .issue_verification(NewAccount {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
/// assert!(!user.enabled);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::user::{NewUser, User, VerificationTicket};
use crate::notify::Notifier;
use crate::store::{Store, StoreError};

/// Default lifetime of a verification code
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 15;

/// Subject line of every verification email
pub const VERIFICATION_SUBJECT: &str = "Verify your account";

/// Generates a 6-digit code, uniform over 100000..=999999
///
/// Codes are not unique across users.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// HTML body of the verification email
pub fn verification_email_body(code: &str) -> String {
    format!(
        "<html>\
         <body style=\"font-family: Arial, sans-serif;\">\
         <div style=\"background-color: #f5f5f5; padding: 20px;\">\
         <h2 style=\"color: #333;\">Welcome to Todolist!</h2>\
         <p style=\"font-size: 16px;\">Enter the verification code below to activate your account:</p>\
         <div style=\"background-color: #fff; padding: 20px; border-radius: 5px;\">\
         <h3 style=\"color: #333;\">Verification Code:</h3>\
         <p style=\"font-size: 18px; font-weight: bold; color: #007bff;\">{}</p>\
         </div>\
         </div>\
         </body>\
         </html>",
        code
    )
}

/// Account fields known before a ticket is issued
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Issues, re-issues and redeems verification codes
pub struct VerificationEngine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl VerificationEngine {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            code_ttl: Duration::minutes(DEFAULT_CODE_TTL_MINUTES),
        }
    }

    /// Overrides the code lifetime
    pub fn with_code_ttl(mut self, code_ttl: Duration) -> Self {
        self.code_ttl = code_ttl;
        self
    }

    fn new_ticket(&self) -> VerificationTicket {
        VerificationTicket {
            code: generate_code(),
            expires_at: self.clock.now() + self.code_ttl,
        }
    }

    async fn send_code(&self, email: &str, code: &str) -> DomainResult<()> {
        self.notifier
            .send_verification_email(email, VERIFICATION_SUBJECT, &verification_email_body(code))
            .await
            .map_err(|e| {
                warn!(error = %e, "Verification email failed");
                DomainError::NotificationFailure(e)
            })
    }

    /// Creates a disabled account with a fresh code and emails the code
    ///
    /// # Errors
    ///
    /// - `EmailAlreadyRegistered` if the email is taken (checked before the
    ///   email is sent and again when inserting)
    /// - `NotificationFailure` if the email could not be sent; nothing is stored
    #[tracing::instrument(skip(self, account), fields(email = %account.email))]
    pub async fn issue_verification(&self, account: NewAccount) -> DomainResult<User> {
        let mut tx = self.store.begin().await?;
        if tx.find_user_by_email(&account.email).await?.is_some() {
            return Err(DomainError::EmailAlreadyRegistered);
        }
        drop(tx);

        let ticket = self.new_ticket();
        self.send_code(&account.email, &ticket.code).await?;

        let mut tx = self.store.begin().await?;
        if tx.find_user_by_email(&account.email).await?.is_some() {
            return Err(DomainError::EmailAlreadyRegistered);
        }

        let user = tx
            .insert_user(NewUser {
                username: account.username,
                email: account.email,
                password_hash: account.password_hash,
                ticket,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => DomainError::EmailAlreadyRegistered,
                other => DomainError::Store(other),
            })?;
        tx.commit().await?;

        info!(user_id = user.id, "Account created, awaiting verification");
        Ok(user)
    }

    /// Redeems a code and enables its account
    ///
    /// The expiration instant itself is still valid.
    ///
    /// # Errors
    ///
    /// - `InvalidCode` if no account holds the code
    /// - `CodeExpired` if the code is past its expiration; the account is
    ///   left untouched
    #[tracing::instrument(skip_all)]
    pub async fn verify(&self, code: &str) -> DomainResult<User> {
        let mut tx = self.store.begin().await?;

        // Held until commit so a code is redeemed at most once
        let mut user = tx
            .lock_user_by_verification_code(code)
            .await?
            .ok_or(DomainError::InvalidCode)?;

        if user.verification_expired(self.clock.now()) {
            debug!(user_id = user.id, "Verification code expired");
            return Err(DomainError::CodeExpired);
        }

        user.enable();
        tx.save_user(&user).await?;
        tx.commit().await?;

        info!(user_id = user.id, "Account verified");
        Ok(user)
    }

    /// Replaces a pending account's code and emails the new one
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no account has this email
    /// - `AlreadyEnabled` if the account is already verified
    /// - `NotificationFailure` if the email could not be sent; the previous
    ///   code stays in place
    #[tracing::instrument(skip(self))]
    pub async fn resend(&self, email: &str) -> DomainResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))?;
        if user.enabled {
            return Err(DomainError::AlreadyEnabled);
        }
        drop(tx);

        let ticket = self.new_ticket();
        self.send_code(email, &ticket.code).await?;

        let mut tx = self.store.begin().await?;
        let mut user = tx
            .lock_user_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))?;
        if user.enabled {
            return Err(DomainError::AlreadyEnabled);
        }

        user.reissue(ticket);
        tx.save_user(&user).await?;
        tx.commit().await?;

        info!(user_id = user.id, "Verification code reissued");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::recording::RecordingNotifier;
    use crate::store::memory::MemoryStore;
    use chrono::{DateTime, Utc};

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<ManualClock>,
        engine: VerificationEngine,
        start: DateTime<Utc>,
    }

    fn harness() -> Harness {
        let start = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(start));
        let engine = VerificationEngine::new(store.clone(), notifier.clone(), clock.clone());

        Harness {
            store,
            notifier,
            clock,
            engine,
            start,
        }
    }

    fn account(email: &str) -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$hash".to_string(),
        }
    }

    async fn stored_user(store: &MemoryStore, email: &str) -> Option<User> {
        let mut tx = store.begin().await.unwrap();
        tx.find_user_by_email(email).await.unwrap()
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_email_body_contains_code() {
        assert!(verification_email_body("123456").contains("123456"));
    }

    #[tokio::test]
    async fn test_issue_creates_pending_user_and_notifies_once() {
        let h = harness();

        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();

        assert!(!user.enabled);
        let code = user.verification_code.clone().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(
            user.verification_expiration,
            Some(h.start + Duration::minutes(15))
        );

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "a@x.com");
        assert_eq!(sent[0].subject, VERIFICATION_SUBJECT);
        assert!(sent[0].body.contains(&code));

        let stored = stored_user(&h.store, "a@x.com").await.unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_issue_respects_custom_ttl() {
        let h = harness();
        let engine = VerificationEngine::new(h.store.clone(), h.notifier.clone(), h.clock.clone())
            .with_code_ttl(Duration::minutes(5));

        let user = engine.issue_verification(account("a@x.com")).await.unwrap();
        assert_eq!(user.verification_expiration, Some(h.start + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_issue_rejects_registered_email_without_sending() {
        let h = harness();
        h.engine.issue_verification(account("a@x.com")).await.unwrap();

        let result = h.engine.issue_verification(account("a@x.com")).await;
        assert!(matches!(result, Err(DomainError::EmailAlreadyRegistered)));
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_issue_notification_failure_stores_nothing() {
        let h = harness();
        h.notifier.set_failing(true);

        let result = h.engine.issue_verification(account("a@x.com")).await;
        assert!(matches!(result, Err(DomainError::NotificationFailure(_))));
        assert!(stored_user(&h.store, "a@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_verify_enables_once() {
        let h = harness();
        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();
        let code = user.verification_code.unwrap();

        h.clock.advance(Duration::minutes(1));
        let verified = h.engine.verify(&code).await.unwrap();
        assert!(verified.enabled);
        assert!(verified.verification_code.is_none());
        assert!(verified.verification_expiration.is_none());

        let again = h.engine.verify(&code).await;
        assert!(matches!(again, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_verify_at_exact_expiration_succeeds() {
        let h = harness();
        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();

        h.clock.set(user.verification_expiration.unwrap());
        let verified = h.engine.verify(user.verification_code.as_deref().unwrap()).await;
        assert!(verified.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_verify_after_expiration_leaves_user_pending() {
        let h = harness();
        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();
        let code = user.verification_code.clone().unwrap();

        h.clock
            .set(user.verification_expiration.unwrap() + Duration::milliseconds(1));
        let result = h.engine.verify(&code).await;
        assert!(matches!(result, Err(DomainError::CodeExpired)));

        let stored = stored_user(&h.store, "a@x.com").await.unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.verification_code, Some(code));
    }

    #[tokio::test]
    async fn test_verify_unknown_code() {
        let h = harness();
        assert!(matches!(
            h.engine.verify("000000").await,
            Err(DomainError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_resend_replaces_code_and_extends_expiration() {
        let h = harness();
        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();

        h.clock.advance(Duration::minutes(20));
        let resent = h.engine.resend("a@x.com").await.unwrap();

        assert!(!resent.enabled);
        assert_eq!(
            resent.verification_expiration,
            Some(h.start + Duration::minutes(35))
        );
        assert_eq!(h.notifier.sent().len(), 2);

        let new_code = resent.verification_code.unwrap();
        assert!(h.notifier.last_to("a@x.com").unwrap().body.contains(&new_code));

        // The expired first code no longer matters; the fresh one works
        let verified = h.engine.verify(&new_code).await.unwrap();
        assert_eq!(verified.id, user.id);
        assert!(verified.enabled);
    }

    #[tokio::test]
    async fn test_resend_errors() {
        let h = harness();
        assert!(matches!(
            h.engine.resend("nobody@x.com").await,
            Err(DomainError::UserNotFound(_))
        ));

        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();
        h.engine
            .verify(user.verification_code.as_deref().unwrap())
            .await
            .unwrap();

        assert!(matches!(
            h.engine.resend("a@x.com").await,
            Err(DomainError::AlreadyEnabled)
        ));
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_resend_notification_failure_keeps_previous_code() {
        let h = harness();
        let user = h.engine.issue_verification(account("a@x.com")).await.unwrap();

        h.notifier.set_failing(true);
        let result = h.engine.resend("a@x.com").await;
        assert!(matches!(result, Err(DomainError::NotificationFailure(_))));

        let stored = stored_user(&h.store, "a@x.com").await.unwrap();
        assert_eq!(stored.verification_code, user.verification_code);
        assert_eq!(stored.verification_expiration, user.verification_expiration);
    }
}
