//! CLI command implementations
//!
//! One module per operation. Commands own the file I/O and user feedback;
//! the protocol work happens in [`crate::device`] and [`crate::session`].

mod read;
mod write;

pub use read::run_read;
pub use write::run_write;
