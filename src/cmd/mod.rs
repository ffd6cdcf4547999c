//! Command declaration and lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{Result, RunError, ShellError};
use crate::exec::{OutputFn, RunRequest, Runner, StdRunner};
use crate::flag::FlagDescriptor;
use crate::option::FlagOption;
use crate::render::{self, PosixRenderer, Renderer};
use crate::retry::Attempts;
use crate::value::Value;

/// Commands time out after 60 seconds unless told otherwise.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Commands are attempted once unless told otherwise.
pub const DEFAULT_RETRY_LIMIT: u32 = 1;

/// Declaration of an external command: the program, its positional argument
/// keys and its flag specs, plus run settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub flags: CmdFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmdFlags {
    /// Wall-clock limit per attempt; `None` is unlimited.
    pub timeout_ms: Option<u64>,
    /// Attempts per `run_multi`; `None` is unbounded.
    pub retry_limit: Option<u32>,
}

impl Default for CmdFlags {
    fn default() -> Self {
        CmdFlags { timeout_ms: Some(DEFAULT_TIMEOUT_MS), retry_limit: Some(DEFAULT_RETRY_LIMIT) }
    }
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec { program: program.into(), ..Default::default() }
    }

    pub fn argument(mut self, key: impl Into<String>) -> Self {
        self.arguments.push(key.into());
        self
    }

    pub fn option(mut self, spec: impl Into<String>) -> Self {
        self.options.push(spec.into());
        self
    }

    pub fn timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.flags.timeout_ms = ms;
        self
    }

    pub fn retry_limit(mut self, limit: Option<u32>) -> Self {
        self.flags.retry_limit = limit;
        self
    }

    /// Check the declaration without building a command.
    pub fn validate(&self) -> Result<()> {
        validate_program(&self.program)?;
        validate_retry_limit(self.flags.retry_limit)?;
        for o in &self.options {
            FlagDescriptor::parse(o)?;
        }
        Ok(())
    }
}

fn validate_program(program: &str) -> Result<()> {
    if program.trim().is_empty() {
        return Err(ShellError::InvalidCommand("must define a command".into()));
    }
    Ok(())
}

fn validate_retry_limit(limit: Option<u32>) -> Result<()> {
    if limit == Some(0) {
        return Err(ShellError::InvalidSetting(
            "retry limit must be at least 1 or unbounded".into(),
        ));
    }
    Ok(())
}

/// A keyed positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    key: String,
    value: Value,
}

impl Argument {
    pub fn key(&self) -> &str { &self.key }
    pub fn value(&self) -> &Value { &self.value }
}

/// An external command with its options and arguments.
///
/// A `Command` drives one process at a time and is meant for a single owner;
/// give each thread its own instance.
#[derive(Debug)]
pub struct Command<R: Runner = StdRunner> {
    program: String,
    command_timeout: Option<Duration>,
    retry_limit: Option<u32>,
    retry_count: u32,
    arguments: Vec<Argument>,
    options: Vec<FlagOption>,
    last_error: Option<RunError>,
    runner: R,
}

impl Command<StdRunner> {
    pub fn new(spec: CommandSpec) -> Result<Self> { Self::with_runner(spec, StdRunner::default()) }
}

impl<R: Runner> Command<R> {
    pub fn with_runner(spec: CommandSpec, runner: R) -> Result<Self> {
        validate_program(&spec.program)?;
        validate_retry_limit(spec.flags.retry_limit)?;

        let mut options: Vec<FlagOption> = Vec::new();
        for o in &spec.options {
            let opt = FlagOption::parse(o)?;
            // first declaration of a flag wins
            if !options.iter().any(|x| x.flag() == opt.flag()) {
                options.push(opt);
            }
        }

        let mut arguments: Vec<Argument> = Vec::new();
        for key in spec.arguments {
            if !arguments.iter().any(|a| a.key == key) {
                arguments.push(Argument { key, value: Value::default() });
            }
        }

        Ok(Command {
            program: spec.program,
            command_timeout: spec.flags.timeout_ms.map(Duration::from_millis),
            retry_limit: spec.flags.retry_limit,
            retry_count: 0,
            arguments,
            options,
            last_error: None,
            runner,
        })
    }

    pub fn program(&self) -> &str { &self.program }

    /// The program is fixed at construction; setting the same name again is
    /// accepted, anything else is an error.
    pub fn set_program(&mut self, program: &str) -> Result<&mut Self> {
        validate_program(program)?;
        if self.program != program {
            return Err(ShellError::CommandRedefined {
                current: self.program.clone(),
                requested: program.to_string(),
            });
        }
        Ok(self)
    }

    pub fn command_timeout(&self) -> Option<Duration> { self.command_timeout }

    pub fn set_command_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.command_timeout = timeout;
        self
    }

    pub fn retry_limit(&self) -> Option<u32> { self.retry_limit }

    pub fn set_retry_limit(&mut self, limit: Option<u32>) -> Result<&mut Self> {
        validate_retry_limit(limit)?;
        self.retry_limit = limit;
        Ok(self)
    }

    /// Attempts made by the current (or last) `run_multi` sequence.
    pub fn retry_count(&self) -> u32 { self.retry_count }

    pub fn last_error(&self) -> Option<&RunError> { self.last_error.as_ref() }

    pub fn runner(&self) -> &R { &self.runner }

    pub fn arguments(&self) -> &[Argument] { &self.arguments }

    pub fn argument(&self, key: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.key == key)
    }

    pub fn options(&self) -> &[FlagOption] { &self.options }

    /// Look up an option by its flag (`-c`) or by the spec it was declared
    /// with (`-c= : count`).
    pub fn option(&self, key: &str) -> Option<&FlagOption> {
        let idx = self.option_index(key)?;
        self.options.get(idx)
    }

    pub fn option_mut(&mut self, key: &str) -> Option<&mut FlagOption> {
        let idx = self.option_index(key)?;
        self.options.get_mut(idx)
    }

    fn option_index(&self, key: &str) -> Option<usize> {
        if let Some(i) = self.options.iter().position(|o| o.flag() == key) {
            return Some(i);
        }
        let flag = FlagDescriptor::parse(key).ok()?.flag;
        self.options.iter().position(|o| o.flag() == flag)
    }

    /// Set an argument's value. Unknown keys are ignored.
    pub fn update_argument(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if let Some(arg) = self.arguments.iter_mut().find(|a| a.key == key) {
            arg.value = value.into();
        }
        self
    }

    /// Enable or disable an option and, when it takes values, add or remove
    /// `value`.
    pub fn update_option(
        &mut self,
        key: &str,
        enabled: bool,
        value: Option<Value>,
        remove: bool,
    ) -> Result<&mut Self> {
        let opt = self.option_mut(key).ok_or_else(|| ShellError::UnknownFlag(key.to_string()))?;
        opt.enable(enabled);
        if opt.can_have_value() {
            if remove {
                opt.remove_value(value)?;
            } else if let Some(v) = value {
                opt.add_value(v)?;
            }
        }
        Ok(self)
    }

    /// `[program, option tokens.., argument values..]`, in declaration order.
    pub fn compile(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        for o in &self.options {
            argv.extend(o.tokens());
        }
        for a in &self.arguments {
            argv.push(a.value.to_token());
        }
        argv
    }

    /// Shell-escaped command line, for diagnostics.
    pub fn command_string(&self) -> String { render::platform().render_argv(&self.compile()) }

    /// The command line followed by its run settings.
    pub fn plan(&self) -> String {
        PosixRenderer.render_plan(&self.compile(), self.command_timeout, self.retry_limit)
    }

    /// Run the command once.
    ///
    /// Returns whether the process exited successfully. Timeouts, idle
    /// timeouts, non-zero exits and runner failures are kept in
    /// [`last_error`](Self::last_error) rather than returned.
    pub fn run_once(
        &mut self,
        idle_timeout: Option<Duration>,
        mut on_output: Option<&mut OutputFn<'_>>,
    ) -> Result<bool> {
        if self.program.is_empty() {
            return Err(ShellError::NoCommand);
        }
        self.last_error = None;

        let argv = self.compile();
        let command_line = PosixRenderer.render_argv(&argv);
        debug!(command = %command_line, attempt = self.retry_count, "running command");

        let req = RunRequest { argv: &argv, timeout: self.command_timeout, idle_timeout };
        let outcome = self.runner.run(&req, &mut |stream, chunk| {
            if let Some(cb) = on_output.as_mut() {
                cb(stream, chunk);
            }
        });

        let err = match outcome {
            Ok(res) if res.success => None,
            Ok(res) => Some(RunError::Failed { code: res.status, command: command_line }),
            Err(e) => Some(e),
        };

        match err {
            None => Ok(true),
            Some(e) => {
                if e.is_unexpected() {
                    error!(error = %e, program = %self.program, "command could not be run");
                } else {
                    warn!(error = %e, program = %self.program, "command failed");
                }
                self.last_error = Some(e);
                Ok(false)
            }
        }
    }

    #[deprecated(note = "use `run_once`")]
    pub fn run(
        &mut self,
        idle_timeout: Option<Duration>,
        on_output: Option<&mut OutputFn<'_>>,
    ) -> Result<bool> {
        self.run_once(idle_timeout, on_output)
    }

    /// Start a retry sequence. Each call to `next()` on the returned iterator
    /// runs one attempt and yields its result; the sequence ends after the
    /// first success or once the retry limit is reached.
    pub fn run_multi<'a>(
        &'a mut self,
        idle_timeout: Option<Duration>,
        on_output: Option<&'a mut OutputFn<'a>>,
    ) -> Result<Attempts<'a, R>> {
        if self.program.is_empty() {
            return Err(ShellError::NoCommand);
        }
        self.retry_count = 0;
        Ok(Attempts::new(self, idle_timeout, on_output))
    }

    pub(crate) fn begin_attempt(&mut self) { self.retry_count += 1; }
}
