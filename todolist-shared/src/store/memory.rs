/// In-memory store
///
/// All state lives behind one `tokio::sync::Mutex`. [`MemoryStore::begin`]
/// takes an owned guard, so transactions are fully serialised. Reads go
/// straight to the guarded state. The first write clones it into a working
/// copy; commit writes the copy back and drop throws it away. Every writing
/// transaction still copies the whole state, so this store is meant for
/// development and tests, not for large data sets.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, Transaction};
use crate::models::{
    ListId, NewTask, NewUser, Task, TaskId, TodoList, User, UserId,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    lists: BTreeMap<ListId, TodoList>,
    tasks: BTreeMap<TaskId, Task>,
    next_user_id: UserId,
    next_list_id: ListId,
    next_task_id: TaskId,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;

        Ok(Box::new(MemoryTransaction {
            guard,
            working: None,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    /// Copy of the guarded state, taken on the first write
    working: Option<MemoryState>,
}

impl MemoryTransaction {
    fn state(&self) -> &MemoryState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        let guard = &self.guard;
        self.working.get_or_insert_with(|| (**guard).clone())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn lock_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_user_by_email(email).await
    }

    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_users_by_ids(&mut self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .filter(|u| u.verification_code.as_deref() == Some(code))
            .max_by_key(|u| (u.verification_expiration, u.id))
            .cloned())
    }

    async fn lock_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError> {
        self.find_user_by_verification_code(code).await
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        if self.state().email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} already exists",
                user.email
            )));
        }

        let id = next_id(&mut self.state_mut().next_user_id);
        let stored = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            enabled: false,
            verification_code: Some(user.ticket.code),
            verification_expiration: Some(user.ticket.expires_at),
            created_at: Utc::now(),
        };
        self.state_mut().users.insert(id, stored.clone());

        Ok(stored)
    }

    async fn save_user(&mut self, user: &User) -> Result<(), StoreError> {
        if !self.state().users.contains_key(&user.id) {
            return Err(StoreError::MissingRow {
                entity: "user",
                id: user.id,
            });
        }
        if self.state().email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::Conflict(format!(
                "email {} already exists",
                user.email
            )));
        }

        self.state_mut().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<(), StoreError> {
        if self.state().lists.values().any(|l| l.owner_id() == id) {
            return Err(StoreError::Conflict(format!("user {} still owns lists", id)));
        }
        if self.state_mut().users.remove(&id).is_none() {
            return Err(StoreError::MissingRow { entity: "user", id });
        }

        for list in self.state_mut().lists.values_mut() {
            list.remove_member(id);
        }
        Ok(())
    }

    async fn find_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError> {
        Ok(self.state().lists.get(&id).cloned())
    }

    async fn lock_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError> {
        // The whole store is already held by this transaction
        self.find_list_by_id(id).await
    }

    async fn find_lists_by_member(&mut self, user: UserId) -> Result<Vec<TodoList>, StoreError> {
        Ok(self
            .state()
            .lists
            .values()
            .filter(|l| l.is_member(user))
            .cloned()
            .collect())
    }

    async fn insert_list(&mut self, title: &str, owner: UserId) -> Result<TodoList, StoreError> {
        if !self.state().users.contains_key(&owner) {
            return Err(StoreError::Conflict(format!("owner {} does not exist", owner)));
        }

        let id = next_id(&mut self.state_mut().next_list_id);
        let list = TodoList::from_parts(id, title.to_string(), owner, [owner]);
        self.state_mut().lists.insert(id, list.clone());

        Ok(list)
    }

    async fn save_list(&mut self, list: &TodoList) -> Result<(), StoreError> {
        if !self.state().lists.contains_key(&list.id) {
            return Err(StoreError::MissingRow {
                entity: "list",
                id: list.id,
            });
        }
        if let Some(missing) = list
            .members()
            .iter()
            .find(|id| !self.state().users.contains_key(id))
        {
            return Err(StoreError::Conflict(format!("member {} does not exist", missing)));
        }

        self.state_mut().lists.insert(list.id, list.clone());
        Ok(())
    }

    async fn delete_list(&mut self, id: ListId) -> Result<(), StoreError> {
        if self.state_mut().lists.remove(&id).is_none() {
            return Err(StoreError::MissingRow { entity: "list", id });
        }

        self.state_mut().tasks.retain(|_, task| task.list_id != id);
        Ok(())
    }

    async fn find_tasks_by_list(&mut self, list: ListId) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .state()
            .tasks
            .values()
            .filter(|t| t.list_id == list)
            .cloned()
            .collect())
    }

    async fn find_task_by_id(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.state().tasks.get(&id).cloned())
    }

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        if !self.state().lists.contains_key(&task.list_id) {
            return Err(StoreError::Conflict(format!(
                "list {} does not exist",
                task.list_id
            )));
        }

        let id = next_id(&mut self.state_mut().next_task_id);
        let stored = Task {
            id,
            list_id: task.list_id,
            title: task.title,
            description: task.description,
            completed: false,
        };
        self.state_mut().tasks.insert(id, stored.clone());

        Ok(stored)
    }

    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError> {
        match self.state_mut().tasks.get_mut(&task.id) {
            Some(stored) => {
                // list_id is fixed at insert
                stored.title = task.title.clone();
                stored.description = task.description.clone();
                stored.completed = task.completed;
                Ok(())
            }
            None => Err(StoreError::MissingRow {
                entity: "task",
                id: task.id,
            }),
        }
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError> {
        match self.state_mut().tasks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingRow { entity: "task", id }),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}
