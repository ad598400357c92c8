//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the reconciler.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{map_error, OutputFormat};
pub use parse::{Cli, Commands, ProjectCommands};
pub use route::RunContext;
