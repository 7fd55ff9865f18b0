//! FileSystem abstraction so project detection can run against a mock tree

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{FileSystem, FileType};
pub use real::RealFileSystem;
