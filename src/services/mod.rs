//! Use cases behind the HTTP handlers.
//!
//! Services compose filter input into specifications, call the repositories
//! and map entities into their read-only views.

pub mod tasks;
pub mod users;

pub use tasks::TaskService;
pub use users::UserService;
