pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskChanges, TaskInsert, TaskOwner, TaskStatus, TaskUpdate};
pub use user::{NewUser, Role, User, UserChanges, UserInsert, UserRegister, UserUpdate};
