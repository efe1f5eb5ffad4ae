/// Request-scoped identity
///
/// The HTTP layer builds a [`RequestContext`] from the bearer token and hands
/// it to every domain operation. Nothing in the core reads identity from
/// anywhere else.
///
/// # Example
///
/// ```
/// use todolist_shared::auth::context::RequestContext;
///
/// let ctx = RequestContext::authenticated("alice@example.com");
/// assert_eq!(ctx.principal(), Some("alice@example.com"));
///
/// assert!(RequestContext::anonymous().principal().is_none());
/// ```

use serde::{Deserialize, Serialize};

use super::jwt::Claims;

/// Authenticated principal for one request, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Email of the authenticated user
    principal: Option<String>,
}

impl RequestContext {
    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            principal: Some(email.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self::authenticated(claims.sub.clone())
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }
}
