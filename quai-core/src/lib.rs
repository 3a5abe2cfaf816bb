//! Core types and scheduling for the quai departure board.

/// Board configuration as delivered by the host at startup.
pub mod config;
/// Domain models shared by providers and presenters.
pub mod model;
/// Traits describing the journey provider interface.
pub mod ports;
/// Poll loop feeding normalized records to the presenter.
pub mod scheduler;
/// Records-out event and the presenter's last-known-good copy.
pub mod timetable;

pub use config::*;
pub use model::*;
pub use ports::*;
pub use scheduler::*;
pub use timetable::*;
