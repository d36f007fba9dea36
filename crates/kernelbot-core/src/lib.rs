//! Kernelbot core: the session controller and everything that talks to it.
//!
//! The browser itself lives behind the [`driver::NotebookDriver`] seam so the
//! locking, state and timing rules here can be exercised against fakes.

pub mod clock;
pub mod commands;
pub mod controller;
pub mod driver;
pub mod monitor;

pub use clock::{Clock, SystemClock};
pub use commands::CommandRouter;
pub use controller::SessionController;
pub use driver::{DriverError, NotebookDriver, StopOutcome};
pub use monitor::IdleMonitor;

#[cfg(test)]
pub(crate) mod testing;
