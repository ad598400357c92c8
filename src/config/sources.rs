//! Configuration sources, applied by the facade in precedence order.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
