mod locate;
mod patch;
mod sync;

pub use locate::cmd_locate;
pub use patch::{PatchArgs, cmd_patch};
pub use sync::{SyncArgs, cmd_sync};

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Success,
  /// Some files could not be registered.
  Partial,
}
