/// Domain models
///
/// # Models
///
/// - `user`: User accounts and the verification state machine
/// - `todo_list`: Lists with an owner and a member set
/// - `task`: Tasks belonging to a single list
///
/// Each model has a `*Projection` counterpart, the only shape that leaves
/// the service layer.
///
/// # Example
///
/// ```
/// use todolist_shared::models::todo_list::TodoList;
///
/// let mut list = TodoList::from_parts(1, "Groceries".to_string(), 10, Vec::new());
/// assert!(list.is_member(10));
/// assert!(list.add_member(20));
/// assert!(!list.remove_member(10));
/// ```

pub mod task;
pub mod todo_list;
pub mod user;

pub use task::{NewTask, Task, TaskId, TaskProjection, TaskUpdate};
pub use todo_list::{ListId, TodoList, TodoListProjection};
pub use user::{NewUser, User, UserId, UserProjection, VerificationTicket};
