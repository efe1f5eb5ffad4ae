/// Membership and ownership checks
///
/// Two-tier trust over a single list: any member may manage the list's
/// content, only the owner may manage its roster, title and lifetime.
/// These are pure functions of the list and the caller; loading the list
/// (and locking it when mutating) is the caller's job.
///
/// # Example
///
/// ```
/// use todolist_shared::auth::authorization::{require_member, require_owner, OwnerAction};
/// use todolist_shared::models::todo_list::TodoList;
///
/// let list = TodoList::from_parts(1, "Groceries".to_string(), 10, vec![20]);
///
/// assert!(require_member(&list, 20).is_ok());
/// assert!(require_owner(&list, 20, OwnerAction::UpdateTitle).is_err());
/// assert!(require_owner(&list, 10, OwnerAction::UpdateTitle).is_ok());
/// ```

use crate::error::{DomainError, DomainResult};
use crate::models::todo_list::TodoList;
use crate::models::user::UserId;

/// Denial reason when the caller is not in the member set
pub const NOT_A_MEMBER: &str = "User is not a member of this list";

/// Owner-only actions, named in denial reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAction {
    AddMember,
    RemoveMember,
    UpdateTitle,
    DeleteList,
}

impl OwnerAction {
    /// Denial reason when a non-owner attempts this action
    pub fn denial_reason(&self) -> &'static str {
        match self {
            OwnerAction::AddMember => "Only the owner can add members",
            OwnerAction::RemoveMember => "Only the owner can remove members",
            OwnerAction::UpdateTitle => "Only the owner can update the title",
            OwnerAction::DeleteList => "Only the owner can delete the list",
        }
    }
}

/// Checks that `user` belongs to the list's member set
///
/// # Errors
///
/// Returns `DomainError::AccessDenied` if the user is not a member
pub fn require_member(list: &TodoList, user: UserId) -> DomainResult<()> {
    if !list.is_member(user) {
        return Err(DomainError::AccessDenied(NOT_A_MEMBER.to_string()));
    }

    Ok(())
}

/// Checks that `user` owns the list
///
/// # Errors
///
/// Returns `DomainError::AccessDenied` naming the attempted action
pub fn require_owner(list: &TodoList, user: UserId, action: OwnerAction) -> DomainResult<()> {
    if !list.is_owner(user) {
        return Err(DomainError::AccessDenied(action.denial_reason().to_string()));
    }

    Ok(())
}
