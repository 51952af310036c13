//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI
//! args and runs the operation against the daemon. Results are written to
//! the given writer; diagnostics go to stderr.
//!
//! `start`, `stop`, `verify` and `rm` act on the torrents they select and
//! print one status line per torrent. Under `--dry-run` they send nothing.

pub mod errors;
pub mod files;
pub mod info;
pub mod list;
pub mod rm;
pub mod start;
pub mod stop;
pub mod verify;
pub mod which;

// Re-export execute functions for convenience
pub use errors::execute as errors;
pub use files::execute as files;
pub use info::execute as info;
pub use list::execute as list;
pub use rm::execute as rm;
pub use start::execute as start;
pub use stop::execute as stop;
pub use verify::execute as verify;
pub use which::execute as which;

/// How results are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStyle {
    /// Leave out headers and blank separator lines
    pub quiet: bool,
    /// Colour result lines
    pub color: bool,
}
