/// Task operations
///
/// Any member of a task's list may create, read, update and delete its
/// tasks. Writes lock the owning list first so they serialise with roster
/// changes and list deletion.

use std::sync::Arc;

use tracing::{debug, info};

use super::resolve_caller;
use crate::auth::authorization::require_member;
use crate::auth::context::RequestContext;
use crate::error::{DomainError, DomainResult};
use crate::models::{ListId, NewTask, TaskId, TaskProjection, TaskUpdate};
use crate::store::{Store, Transaction};

pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Locks the list owning `task_id` and checks the caller belongs to it
    async fn lock_for_task(
        tx: &mut dyn Transaction,
        ctx: &RequestContext,
        task_id: TaskId,
    ) -> DomainResult<()> {
        let caller = resolve_caller(tx, ctx).await?;

        let task = tx
            .find_task_by_id(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;

        // Tasks never move between lists, so a missing list means the task went with it
        let list = tx
            .lock_list_by_id(task.list_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        require_member(&list, caller.id)
    }

    #[tracing::instrument(skip(self, ctx, description))]
    pub async fn add_task(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
        title: &str,
        description: Option<&str>,
    ) -> DomainResult<TaskProjection> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let list = tx
            .lock_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_member(&list, caller.id)?;

        let task = tx
            .insert_task(NewTask {
                list_id,
                title: title.to_string(),
                description: description.map(str::to_string),
            })
            .await?;
        tx.commit().await?;

        info!(list_id, task_id = task.id, "Task created");
        Ok(task.projection())
    }

    /// Tasks of a list ordered by ID
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_tasks(
        &self,
        ctx: &RequestContext,
        list_id: ListId,
    ) -> DomainResult<Vec<TaskProjection>> {
        let mut tx = self.store.begin().await?;
        let caller = resolve_caller(tx.as_mut(), ctx).await?;

        let list = tx
            .find_list_by_id(list_id)
            .await?
            .ok_or(DomainError::ListNotFound(list_id))?;
        require_member(&list, caller.id)?;

        let tasks = tx.find_tasks_by_list(list_id).await?;
        Ok(tasks.iter().map(|t| t.projection()).collect())
    }

    /// Replaces the title, description and completion flag
    #[tracing::instrument(skip(self, ctx, update))]
    pub async fn update_task(
        &self,
        ctx: &RequestContext,
        task_id: TaskId,
        update: TaskUpdate,
    ) -> DomainResult<TaskProjection> {
        let mut tx = self.store.begin().await?;
        Self::lock_for_task(tx.as_mut(), ctx, task_id).await?;

        // Re-read under the list lock
        let mut task = tx
            .find_task_by_id(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        task.apply(update);
        tx.save_task(&task).await?;
        tx.commit().await?;

        debug!(task_id, completed = task.completed, "Task updated");
        Ok(task.projection())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_task(&self, ctx: &RequestContext, task_id: TaskId) -> DomainResult<()> {
        let mut tx = self.store.begin().await?;
        Self::lock_for_task(tx.as_mut(), ctx, task_id).await?;

        tx.delete_task(task_id).await?;
        tx.commit().await?;

        info!(task_id, "Task deleted");
        Ok(())
    }
}
