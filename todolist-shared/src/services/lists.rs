/// List operations
///
/// | Operation | Who may call |
/// |---|---|
/// | `create_list`, `list_lists_for_user` | any authenticated user |
/// | `get_list` | members |
/// | `add_member`, `remove_member`, `update_title`, `delete_list` | the owner |
///
/// Mutations take the list with `lock_list_by_id`, so concurrent roster
/// changes on one list are applied one after another.

use std::sync::Arc;

use tracing::{debug, info};

use super::{project_list, resolve_caller};
use crate::auth::authorization::{require_member, require_owner, OwnerAction, NOT_A_MEMBER};
use crate::auth::context::RequestContext;
use crate::error::{DomainError, DomainResult};
use crate::models::{ListId, TodoListProjection};
use crate::store::Store;

/// Denial reason when the owner is the removal target
pub const OWNER_NOT_REMOVABLE: &str = "Owner cannot be removed";

pub struct ListService {
    store: Arc<dyn Store>,
}

impl ListService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a list owned by the caller, who becomes its only member
    #[tracing::instrument(skip(self, ctx))]
    pub async fn create_list(
        &self,
        ctx: &RequestContext,
        title: &str,
    ) -> DomainResult<TodoListProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let list = tx.insert_list(title, caller.id).await?;
        let projection = project_list(tx.as_mut(), &list).await?;
        tx.commit().await?;

        info!(list_id = list.id, owner_id = caller.id, "List created");
        Ok(projection)
    }

    /// Every list the caller is a member of, ordered by ID
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_lists_for_user(
        &self,
        ctx: &RequestContext,
    ) -> DomainResult<Vec<TodoListProjection>> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let lists = tx.find_lists_by_member(caller.id).await?;
        let mut projections = Vec::with_capacity(lists.len());
        for list in &lists {
            projections.push(project_list(tx.as_mut(), list).await?);
        }

        Ok(projections)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_list(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
    ) -> DomainResult<TodoListProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let list = tx
            .find_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_member(&list, caller.id)?;

        project_list(tx.as_mut(), &list).await
    }

    /// Adds the user registered under `member_email` to the list
    ///
    /// # Errors
    ///
    /// - `ListNotFound`
    /// - `AccessDenied` unless the caller owns the list
    /// - `UserNotFound` if no user has that email
    /// - `AlreadyMember` if the user is already in the list
    #[tracing::instrument(skip(self, ctx))]
    pub async fn add_member(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
        member_email: &str,
    ) -> DomainResult<TodoListProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let mut list = tx
            .lock_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_owner(&list, caller.id, OwnerAction::AddMember)?;

        let member = tx
            .find_user_by_email(member_email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(member_email.to_string()))?;

        if !list.add_member(member.id) {
            return Err(DomainError::AlreadyMember);
        }

        tx.save_list(&list).await?;
        let projection = project_list(tx.as_mut(), &list).await?;
        tx.commit().await?;

        info!(list_id, member_id = member.id, "Member added");
        Ok(projection)
    }

    /// Removes a non-owner member from the list
    ///
    /// # Errors
    ///
    /// - `ListNotFound`
    /// - `AccessDenied` unless the caller owns the list, if the target is not
    ///   a member, or if the target is the owner
    /// - `UserNotFound` if no user has that email
    #[tracing::instrument(skip(self, ctx))]
    pub async fn remove_member(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
        member_email: &str,
    ) -> DomainResult<TodoListProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let mut list = tx
            .lock_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_owner(&list, caller.id, OwnerAction::RemoveMember)?;

        let member = tx
            .find_user_by_email(member_email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(member_email.to_string()))?;

        if !list.is_member(member.id) {
            return Err(DomainError::AccessDenied(NOT_A_MEMBER.to_string()));
        }
        if list.is_owner(member.id) {
            return Err(DomainError::AccessDenied(OWNER_NOT_REMOVABLE.to_string()));
        }

        list.remove_member(member.id);
        tx.save_list(&list).await?;
        let projection = project_list(tx.as_mut(), &list).await?;
        tx.commit().await?;

        info!(list_id, member_id = member.id, "Member removed");
        Ok(projection)
    }

    /// Renames the list; members without ownership are refused
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_title(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
        title: &str,
    ) -> DomainResult<TodoListProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let mut list = tx
            .lock_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_member(&list, caller.id)?;
        require_owner(&list, caller.id, OwnerAction::UpdateTitle)?;

        list.title = title.to_string();
        tx.save_list(&list).await?;
        let projection = project_list(tx.as_mut(), &list).await?;
        tx.commit().await?;

        debug!(list_id, "List title updated");
        Ok(projection)
    }

    /// Deletes the list and all of its tasks
    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_list(&self, ctx: &RequestContext, list_id: ListId) -> DomainResult<()> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let list = tx
            .lock_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_owner(&list, caller.id, OwnerAction::DeleteList)?;

        tx.delete_list(list.id).await?;
        tx.commit().await?;

        info!(list_id, "List deleted");
        Ok(())
    }
}
