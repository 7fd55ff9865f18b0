//! Progress reporting for build lifecycle events

mod handler;
mod logging;

pub use handler::{BuildEvent, NoOpHandler, ProgressHandler};
pub use logging::LoggingHandler;
