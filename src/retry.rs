//! Bounded retry sequences.

use std::iter::FusedIterator;
use std::time::Duration;

use crate::cmd::Command;
use crate::error::RunError;
use crate::exec::{OutputFn, Runner};

/// One `run_multi` sequence, returned by [`Command::run_multi`].
///
/// Nothing runs in the background: each `next()` performs exactly one
/// attempt and yields whether it succeeded. The sequence stops after a
/// success or once `retry_limit` attempts have been made.
pub struct Attempts<'a, R: Runner> {
    command: &'a mut Command<R>,
    idle_timeout: Option<Duration>,
    on_output: Option<&'a mut OutputFn<'a>>,
    succeeded: bool,
    done: bool,
}

impl<'a, R: Runner> Attempts<'a, R> {
    pub(crate) fn new(
        command: &'a mut Command<R>,
        idle_timeout: Option<Duration>,
        on_output: Option<&'a mut OutputFn<'a>>,
    ) -> Self {
        Attempts { command, idle_timeout, on_output, succeeded: false, done: false }
    }

    pub fn retry_count(&self) -> u32 { self.command.retry_count() }

    pub fn last_error(&self) -> Option<&RunError> { self.command.last_error() }

    pub fn succeeded(&self) -> bool { self.succeeded }

    fn may_attempt(&self) -> bool {
        !self.done
            && !self.succeeded
            && self.command.retry_limit().map_or(true, |limit| self.command.retry_count() < limit)
    }
}

impl<'a, R: Runner> Iterator for Attempts<'a, R> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if !self.may_attempt() {
            return None;
        }
        self.command.begin_attempt();
        match self.command.run_once(self.idle_timeout, self.on_output.as_deref_mut()) {
            Ok(ok) => {
                self.succeeded = ok;
                Some(ok)
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

impl<'a, R: Runner> FusedIterator for Attempts<'a, R> {}
