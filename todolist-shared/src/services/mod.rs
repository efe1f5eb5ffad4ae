/// List and task operations
///
/// Every operation takes the caller's [`RequestContext`] explicitly, runs
/// its checks and writes inside one store transaction, and returns
/// projections rather than stored entities.
///
/// An absent principal, or one that no longer matches a stored user, is
/// `Unauthenticated`.

pub mod lists;
pub mod tasks;

use std::collections::BTreeMap;

use crate::auth::context::RequestContext;
use crate::error::{DomainError, DomainResult};
use crate::models::{TodoList, TodoListProjection, User};
use crate::store::{StoreError, Transaction};

pub use lists::ListService;
pub use tasks::TaskService;

/// Loads the user behind the request's principal
pub(crate) async fn resolve_caller(
    tx: &mut dyn Transaction,
    ctx: &RequestContext,
) -> DomainResult<User> {
    let email = ctx.principal().ok_or(DomainError::Unauthenticated)?;

    tx.find_user_by_email(email)
        .await?
        .ok_or(DomainError::Unauthenticated)
}

/// Builds the public view of a list with its members and tasks
pub(crate) async fn project_list(
    tx: &mut dyn Transaction,
    list: &TodoList,
) -> DomainResult<TodoListProjection> {
    let member_ids: Vec<_> = list.members().iter().copied().collect();
    let users: BTreeMap<_, _> = tx
        .find_users_by_ids(&member_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let owner = users
        .get(&list.owner_id())
        .ok_or(StoreError::MissingRow {
            entity: "user",
            id: list.owner_id(),
        })?
        .projection();

    let tasks = tx
        .find_tasks_by_list(list.id)
        .await?
        .iter()
        .map(|t| t.projection())
        .collect();

    Ok(TodoListProjection {
        id: list.id,
        title: list.title.clone(),
        owner,
        members: users.values().map(User::projection).collect(),
        tasks,
    })
}
