/// User model
///
/// A user account moves through a small state machine:
///
/// ```text
/// signup ──> pending (enabled = false, code + expiration set)
///               │  ▲
///     verify ok │  │ resend (fresh code + expiration)
///               ▼  │
///            enabled (code and expiration cleared)
/// ```
///
/// An enabled user never carries a verification code or expiration. The
/// mutators on [`User`] are the only way the services change these fields,
/// so the invariant holds for every value that reaches a store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(255) NOT NULL,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     enabled BOOLEAN NOT NULL DEFAULT FALSE,
///     verification_code VARCHAR(6),
///     verification_expiration TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable numeric user identity
pub type UserId = i64;

/// A freshly issued one-time verification code and the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Persisted user account
///
/// The password hash and verification fields are never serialized; use
/// [`UserProjection`] for anything that leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: UserId,

    /// Display name chosen at signup
    pub username: String,

    /// Email address, unique and compared exactly as stored
    pub email: String,

    /// Opaque password hash (PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the account has been verified
    pub enabled: bool,

    /// Pending one-time code, `None` once enabled
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,

    /// When the pending code expires, `None` once enabled
    #[serde(skip_serializing)]
    pub verification_expiration: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Marks the account verified and clears the pending code
    pub fn enable(&mut self) {
        self.enabled = true;
        self.verification_code = None;
        self.verification_expiration = None;
    }

    /// Replaces the pending code with a new ticket
    ///
    /// The account is (re)set to disabled; callers check `enabled` first when
    /// re-enabling must be refused.
    pub fn reissue(&mut self, ticket: VerificationTicket) {
        self.enabled = false;
        self.verification_code = Some(ticket.code);
        self.verification_expiration = Some(ticket.expires_at);
    }

    /// Whether the pending code is no longer usable at `now`
    ///
    /// The expiration instant itself is still valid. A user without an
    /// expiration has nothing left to verify and is treated as expired.
    pub fn verification_expired(&self, now: DateTime<Utc>) -> bool {
        match self.verification_expiration {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }

    /// Public view of this user
    pub fn projection(&self) -> UserProjection {
        UserProjection {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input for inserting a new, not yet verified user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub ticket: VerificationTicket,
}

/// Public user view embedded in list projections and API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProjection {
    pub id: UserId,
    pub username: String,
    pub email: String,
}
