/// To-do list model
///
/// A list has exactly one owner and a set of members. The owner is always a
/// member: [`TodoList::from_parts`] inserts it and [`TodoList::remove_member`]
/// refuses to drop it, so no value of this type can violate the rule.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todo_lists (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     owner_id BIGINT NOT NULL REFERENCES users(id)
/// );
///
/// CREATE TABLE todo_list_members (
///     list_id BIGINT NOT NULL REFERENCES todo_lists(id),
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (list_id, user_id)
/// );
/// ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::task::TaskProjection;
use super::user::{UserId, UserProjection};

/// Stable numeric list identity
pub type ListId = i64;

/// Persisted to-do list with its membership set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoList {
    /// Unique list ID
    pub id: ListId,

    /// List title
    pub title: String,

    owner_id: UserId,
    members: BTreeSet<UserId>,
}

impl TodoList {
    /// Rebuilds a list from stored parts, adding the owner to the members
    pub fn from_parts(
        id: ListId,
        title: String,
        owner_id: UserId,
        members: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let mut members: BTreeSet<UserId> = members.into_iter().collect();
        members.insert(owner_id);

        Self {
            id,
            title,
            owner_id,
            members,
        }
    }

    /// The owning user
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Member IDs in ascending order (owner included)
    pub fn members(&self) -> &BTreeSet<UserId> {
        &self.members
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Adds a member, returning false if they were already present
    pub fn add_member(&mut self, user_id: UserId) -> bool {
        self.members.insert(user_id)
    }

    /// Removes a member, returning false if they were absent or are the owner
    pub fn remove_member(&mut self, user_id: UserId) -> bool {
        if user_id == self.owner_id {
            return false;
        }
        self.members.remove(&user_id)
    }
}

/// Public list view returned by every list operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListProjection {
    pub id: ListId,
    pub title: String,
    pub owner: UserProjection,
    /// Members ordered by user ID
    pub members: Vec<UserProjection>,
    /// Tasks ordered by task ID
    pub tasks: Vec<TaskProjection>,
}
