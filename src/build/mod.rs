//! Build execution: state machine, result record, caller handle and worker

mod cancel;
mod handle;
mod result;
mod state;
mod task;

pub use cancel::CancelToken;
pub use handle::{BuildHandle, BuildSnapshot};
pub use result::BuildResult;
pub use state::BuildState;
pub use task::{BuildTask, DEFAULT_GRACE_PERIOD};
