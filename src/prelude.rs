//! shellspec::prelude - grab-and-go imports for declaring and running commands

pub use crate::error::{Result, RunError, ShellError};
pub use crate::flag::FlagDescriptor;
pub use crate::value::Value;
pub use crate::option::FlagOption;
pub use crate::cmd::{Argument, CmdFlags, Command, CommandSpec};
pub use crate::exec::{ExecResult, OutputFn, RunRequest, Runner, StdRunner, Stream};
pub use crate::retry::Attempts;
