mod system;
pub mod terminate;

pub use system::System;
pub use terminate::{TerminateSystem, TERMINATE_TOOL_NAME};
