/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing behind the `PasswordHasher` port
/// - [`jwt`]: HS256 bearer tokens
/// - [`context`]: Request-scoped identity passed into every operation
/// - [`authorization`]: Membership and ownership checks over a list
/// - [`verification`]: Emailed one-time codes and account enabling
/// - [`authenticator`]: Signup and credential checks
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_shared::auth::{
///     authenticator::Authenticator, password::Argon2Hasher, verification::VerificationEngine,
/// };
/// use todolist_shared::clock::SystemClock;
/// use todolist_shared::notify::log::LogNotifier;
/// use todolist_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// let verification = Arc::new(VerificationEngine::new(
///     store.clone(),
///     Arc::new(LogNotifier::new()),
///     Arc::new(SystemClock),
/// ));
/// let authenticator = Authenticator::new(store, Arc::new(Argon2Hasher::default()), verification);
///
/// let user = authenticator.signup("alice", "alice@example.com", "password123").await?;
/// assert!(!user.enabled);
/// # Ok(())
/// # }
/// ```

pub mod authenticator;
pub mod authorization;
pub mod context;
pub mod jwt;
pub mod password;
pub mod verification;
