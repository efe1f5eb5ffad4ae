/// Domain error type
///
/// Every list, task and account operation returns [`DomainResult`]. The HTTP
/// layer maps each variant to a status code; nothing here knows about HTTP.

use crate::auth::password::PasswordError;
use crate::models::{ListId, TaskId};
use crate::notify::NotifyError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("List {0} not found")]
    ListNotFound(ListId),

    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not verified")]
    AccountNotEnabled,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification code has expired")]
    CodeExpired,

    #[error("Account is already verified")]
    AlreadyEnabled,

    #[error("User is already a member of this list")]
    AlreadyMember,

    #[error("Email is already registered")]
    EmailAlreadyRegistered,

    #[error("Failed to send verification email")]
    NotificationFailure(#[source] NotifyError),

    #[error("Authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub type DomainResult<T> = Result<T, DomainError>;
