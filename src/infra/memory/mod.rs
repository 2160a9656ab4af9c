// In-memory implementations of the filing ports.
// Nothing leaves the process, and every call is recorded for assertions.

pub mod in_memory_drive;
pub mod in_memory_sheet;

pub use in_memory_drive::{DriveCall, DriveOp, InMemoryDrive};
pub use in_memory_sheet::InMemorySheet;
