//! Domain data types for the calendar and task subsystems.

pub mod calendar;
pub mod integration;
pub mod task;

pub use calendar::*;
pub use integration::*;
pub use task::*;
