//! Calendar lifecycle and calendar-scoped events.

pub mod ports;
pub mod service;

pub use service::CalendarService;
