/// PostgreSQL store
///
/// Each [`PgTransaction`] wraps one `sqlx::Transaction`. sqlx rolls the
/// transaction back when it is dropped without a commit, which gives the
/// port its drop-means-rollback contract for free.
///
/// # Example
///
/// ```no_run
/// use todolist_shared::db::pool::{create_pool, DatabaseConfig};
/// use todolist_shared::store::{postgres::PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let mut tx = store.begin().await?;
/// let lists = tx.find_lists_by_member(1).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use super::{Store, StoreError, Transaction};
use crate::models::{
    ListId, NewTask, NewUser, Task, TaskId, TodoList, User, UserId,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, enabled, \
     verification_code, verification_expiration, created_at";

const TASK_COLUMNS: &str = "id, list_id, title, description, completed";

/// Maps constraint violations to `Conflict`, everything else to `Database`
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    /// Attaches member sets to `(id, title, owner_id)` rows
    async fn hydrate_lists(
        &mut self,
        rows: Vec<(ListId, String, UserId)>,
    ) -> Result<Vec<TodoList>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ListId> = rows.iter().map(|(id, _, _)| *id).collect();
        let memberships = sqlx::query_as::<_, (ListId, UserId)>(
            "SELECT list_id, user_id FROM todo_list_members WHERE list_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut members: BTreeMap<ListId, Vec<UserId>> = BTreeMap::new();
        for (list_id, user_id) in memberships {
            members.entry(list_id).or_default().push(user_id);
        }

        Ok(rows
            .into_iter()
            .map(|(id, title, owner_id)| {
                let list_members = members.remove(&id).unwrap_or_default();
                TodoList::from_parts(id, title, owner_id, list_members)
            })
            .collect())
    }

    async fn load_user_by_email(
        &mut self,
        email: &str,
        for_update: bool,
    ) -> Result<Option<User>, StoreError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1{}",
            USER_COLUMNS, lock
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    /// Latest-expiring holder of `code`
    ///
    /// With `for_update`, a row whose code was cleared while this query
    /// waited on its lock no longer matches and nothing is returned.
    async fn load_user_by_code(
        &mut self,
        code: &str,
        for_update: bool,
    ) -> Result<Option<User>, StoreError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE verification_code = $1 \
             ORDER BY verification_expiration DESC NULLS LAST, id DESC LIMIT 1{}",
            USER_COLUMNS, lock
        ))
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn load_list(
        &mut self,
        id: ListId,
        for_update: bool,
    ) -> Result<Option<TodoList>, StoreError> {
        let sql = if for_update {
            "SELECT id, title, owner_id FROM todo_lists WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT id, title, owner_id FROM todo_lists WHERE id = $1"
        };

        let row = sqlx::query_as::<_, (ListId, String, UserId)>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate_lists(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.load_user_by_email(email, false).await
    }

    async fn lock_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.load_user_by_email(email, true).await
    }

    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&mut self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY id",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(users)
    }

    async fn find_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError> {
        self.load_user_by_code(code, false).await
    }

    async fn lock_user_by_verification_code(
        &mut self,
        code: &str,
    ) -> Result<Option<User>, StoreError> {
        self.load_user_by_code(code, true).await
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, enabled, \
             verification_code, verification_expiration) \
             VALUES ($1, $2, $3, FALSE, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.ticket.code)
        .bind(user.ticket.expires_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(inserted)
    }

    async fn save_user(&mut self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, enabled = $5,
                verification_code = $6, verification_expiration = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.enabled)
        .bind(&user.verification_code)
        .bind(user.verification_expiration)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                entity: "user",
                id: user.id,
            });
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow { entity: "user", id });
        }
        Ok(())
    }

    async fn find_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError> {
        self.load_list(id, false).await
    }

    async fn lock_list_by_id(&mut self, id: ListId) -> Result<Option<TodoList>, StoreError> {
        self.load_list(id, true).await
    }

    async fn find_lists_by_member(&mut self, user: UserId) -> Result<Vec<TodoList>, StoreError> {
        let rows = sqlx::query_as::<_, (ListId, String, UserId)>(
            r#"
            SELECT l.id, l.title, l.owner_id
            FROM todo_lists l
            INNER JOIN todo_list_members m ON m.list_id = l.id
            WHERE m.user_id = $1
            ORDER BY l.id
            "#,
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;

        self.hydrate_lists(rows).await
    }

    async fn insert_list(&mut self, title: &str, owner: UserId) -> Result<TodoList, StoreError> {
        let (id,) = sqlx::query_as::<_, (ListId,)>(
            "INSERT INTO todo_lists (title, owner_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(title)
        .bind(owner)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query("INSERT INTO todo_list_members (list_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(owner)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(TodoList::from_parts(id, title.to_string(), owner, [owner]))
    }

    async fn save_list(&mut self, list: &TodoList) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE todo_lists SET title = $2 WHERE id = $1")
            .bind(list.id)
            .bind(&list.title)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                entity: "list",
                id: list.id,
            });
        }

        let members: Vec<UserId> = list.members().iter().copied().collect();

        sqlx::query(
            "DELETE FROM todo_list_members WHERE list_id = $1 AND NOT (user_id = ANY($2))",
        )
        .bind(list.id)
        .bind(&members)
        .execute(&mut *self.tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO todo_list_members (list_id, user_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(list.id)
        .bind(&members)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_list(&mut self, id: ListId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tasks WHERE list_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query("DELETE FROM todo_list_members WHERE list_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        let result = sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow { entity: "list", id });
        }
        Ok(())
    }

    async fn find_tasks_by_list(&mut self, list: ListId) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE list_id = $1 ORDER BY id",
            TASK_COLUMNS
        ))
        .bind(list)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(tasks)
    }

    async fn find_task_by_id(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(task)
    }

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        let inserted = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (list_id, title, description, completed) \
             VALUES ($1, $2, $3, FALSE) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.list_id)
        .bind(&task.title)
        .bind(&task.description)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(inserted)
    }

    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE tasks SET title = $2, description = $3, completed = $4 WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                entity: "task",
                id: task.id,
            });
        }
        Ok(())
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow { entity: "task", id });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
