//! # Daybook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Access-control policy decision functions
//! - Port/adapter interfaces (traits)
//! - The calendar, task, integration, and user-role services
//!
//! ## Architecture Principles
//! - Only depends on `daybook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod integration;
pub mod policy;
pub mod task;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use calendar::ports::{CalendarEventRepository, CalendarRepository};
pub use calendar::CalendarService;
pub use integration::ports::IntegrationRepository;
pub use integration::IntegrationService;
pub use policy::{Access, Actor, DeniedReason};
pub use task::ports::TaskRepository;
pub use task::TaskService;
pub use user::ports::UserRoleRepository;
pub use user::UserRoleService;
