mod coordinator;
mod execution;

pub use coordinator::CoordinatorClient;
pub use execution::{ArchiveExtractor, ScriptExit, ScriptInvocation, ScriptRunner, TempDirPurger};
