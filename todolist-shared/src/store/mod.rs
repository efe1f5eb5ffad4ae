/// Transactional persistence port
///
/// Services never talk to a database directly. They open a [`Transaction`]
/// from a [`Store`], do their check-then-mutate work through it, and call
/// [`Transaction::commit`]. Dropping a transaction without committing rolls
/// it back, so an early `?` return never leaves partial writes behind.
///
/// # Adapters
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx; list mutations lock the
///   list row with `SELECT ... FOR UPDATE`
/// - [`memory::MemoryStore`]: in-process state; a transaction holds the
///   store's single async mutex until it is committed or dropped
///
/// # Example
///
/// ```
/// use todolist_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let mut tx = store.begin().await?;
/// assert!(tx.find_user_by_email("nobody@example.com").await?.is_none());
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    ListId, NewTask, NewUser, Task, TaskId, TodoList, User, UserId,
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness or referential constraint was violated
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// An update or delete targeted a row that does not exist
    #[error("{entity} {id} does not exist")]
    MissingRow { entity: &'static str, id: i64 },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Source of transactions
#[async_trait]
pub trait Store: Send + Sync {
    /// Starts a new transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    /// Checks that the backing storage is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One unit of work against the store
///
/// Collections come back ordered by ID.
#[async_trait]
pub trait Transaction: Send {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// Like [`Transaction::find_user_by_email`], holding the row until the
    /// transaction ends
    async fn lock_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Loads the users that exist among `ids`
    async fn find_users_by_ids(&mut self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

    /// Finds the user holding `code`
    ///
    /// Codes are not unique across users; the most recently issued one wins.
    async fn find_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Like [`Transaction::find_user_by_verification_code`], holding the row
    /// until the transaction ends
    ///
    /// A concurrent transaction that redeems or replaces the code first
    /// makes this return `None`.
    async fn lock_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Inserts a disabled user carrying the ticket's code and expiration
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the email is already taken
    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError>;

    async fn save_user(&mut self, user: &User) -> Result<(), StoreError>;

    async fn delete_user(&mut self, id: UserId) -> Result<(), StoreError>;

    async fn find_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError>;

    /// Loads a list and holds it exclusively until the transaction ends
    async fn lock_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError>;

    async fn find_lists_by_member(&mut self, user: UserId) -> Result<Vec<TodoList>, StoreError>;

    /// Inserts a list owned by `owner` with the owner as sole member
    async fn insert_list(&mut self, title: &str, owner: UserId) -> Result<TodoList, StoreError>;

    /// Persists the title and brings stored membership in line with `list`
    async fn save_list(&mut self, list: &TodoList) -> Result<(), StoreError>;

    /// Deletes the list's tasks, memberships and the list itself
    async fn delete_list(&mut self, id: ListId) -> Result<(), StoreError>;

    async fn find_tasks_by_list(&mut self, list: ListId) -> Result<Vec<Task>, StoreError>;

    async fn find_task_by_id(&mut self, id: TaskId) -> Result<Option<Task>, StoreError>;

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError>;

    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError>;

    async fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError>;

    /// Makes every write in this transaction durable
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
