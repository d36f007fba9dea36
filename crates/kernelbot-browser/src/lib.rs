//! Browser automation against the Kaggle web UI.
//!
//! Kaggle publishes no API contract for the flows driven here; everything
//! hangs off the current markup. Selector chains keep that brittleness in
//! one place, and the session is opened per task and torn down afterwards so
//! a wedged page never outlives the operation that wedged it.

mod actions;
mod auth;
mod driver;
mod install;
mod locate;
mod session;

pub use driver::KaggleDriver;
pub use session::{BrowserSession, BrowserSettings};
