//! Database implementations

pub mod calendar_repository;
pub mod event_repository;
pub mod integration_repository;
pub mod manager;
pub mod records;
pub mod store;
pub mod task_repository;
pub mod user_role_repository;

pub use calendar_repository::SqliteCalendarRepository;
pub use event_repository::SqliteCalendarEventRepository;
pub use integration_repository::SqliteIntegrationRepository;
pub use manager::DbManager;
pub use task_repository::SqliteTaskRepository;
pub use user_role_repository::SqliteUserRoleRepository;
