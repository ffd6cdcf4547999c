//! shellspec: declarative external commands.
//!
//! A command is declared once (program, positional argument keys and flag
//! specs such as `-c= : count`), mutated through its options and arguments,
//! compiled into an argument vector and run with a wall-clock timeout, an
//! idle timeout and a bounded number of attempts.

pub mod error;
pub mod flag;
pub mod value;
pub mod option;
pub mod cmd;
pub mod exec;
pub mod retry;
pub mod render;
pub mod prelude;
pub mod macros;

pub use error::{Result, RunError, ShellError};
