//! Execution interfaces: the boundary between a `Command` and the process
//! that runs it.

use std::io::Read;
use std::process::{Child, Command as Process, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::RunError;

/// Which output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Callback receiving every chunk of process output as it arrives.
pub type OutputFn<'a> = dyn FnMut(Stream, &[u8]) + 'a;

#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    /// Program first, then its arguments.
    pub argv: &'a [String],
    /// Absolute wall-clock limit; `None` is unlimited.
    pub timeout: Option<Duration>,
    /// Longest allowed gap between output chunks; `None` is unlimited.
    pub idle_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Exit code, `None` if the process was ended by a signal.
    pub status: Option<i32>,
    pub success: bool,
}

pub trait Runner {
    /// Run `req.argv` to completion, feeding output to `on_output`.
    ///
    /// Exceeding either timeout must terminate the process and return
    /// `RunError::Timeout` / `RunError::IdleTimeout`.
    fn run(
        &self,
        req: &RunRequest<'_>,
        on_output: &mut OutputFn<'_>,
    ) -> Result<ExecResult, RunError>;
}

impl<T: Runner + ?Sized> Runner for &T {
    fn run(
        &self,
        req: &RunRequest<'_>,
        on_output: &mut OutputFn<'_>,
    ) -> Result<ExecResult, RunError> {
        (**self).run(req, on_output)
    }
}

/// Runs the program directly (no shell), with stdin closed and both output
/// streams piped back through the callback.
#[derive(Debug, Clone)]
pub struct StdRunner {
    /// How often timeouts are checked while the process is silent.
    pub poll_interval: Duration,
    /// After the process exits, how long to wait for each further chunk
    /// before giving up on pipes still held open by its descendants.
    pub exit_grace: Duration,
}

impl Default for StdRunner {
    fn default() -> Self {
        StdRunner {
            poll_interval: Duration::from_millis(10),
            exit_grace: Duration::from_millis(50),
        }
    }
}

impl Runner for StdRunner {
    fn run(
        &self,
        req: &RunRequest<'_>,
        on_output: &mut OutputFn<'_>,
    ) -> Result<ExecResult, RunError> {
        let (program, args) = req.argv.split_first().ok_or_else(|| RunError::Spawn {
            program: String::new(),
            source: std::io::ErrorKind::InvalidInput.into(),
        })?;

        let mut child = Process::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn { program: program.clone(), source })?;

        let (tx, rx) = mpsc::channel();
        if let Some(out) = child.stdout.take() { pump(out, Stream::Stdout, tx.clone()); }
        if let Some(err) = child.stderr.take() { pump(err, Stream::Stderr, tx.clone()); }
        drop(tx);

        let started = Instant::now();
        let mut last_output = started;
        let mut streams_open = true;
        loop {
            if streams_open {
                match rx.recv_timeout(self.poll_interval) {
                    Ok((stream, chunk)) => {
                        last_output = Instant::now();
                        on_output(stream, &chunk[..]);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => streams_open = false,
                }
            } else {
                thread::sleep(self.poll_interval);
            }

            if let Some(status) = child.try_wait()? {
                if streams_open {
                    drain(&rx, on_output, self.exit_grace);
                }
                return Ok(ExecResult { status: status.code(), success: status.success() });
            }

            let now = Instant::now();
            if let Some(limit) = req.timeout {
                if now.duration_since(started) >= limit {
                    terminate(&mut child);
                    return Err(RunError::Timeout(limit));
                }
            }
            if let Some(idle) = req.idle_timeout {
                if now.duration_since(last_output) >= idle {
                    terminate(&mut child);
                    return Err(RunError::IdleTimeout(idle));
                }
            }
        }
    }
}

// Reader threads are detached: a grandchild may keep the pipe open after the
// child is gone.
fn pump<T: Read + Send + 'static>(mut src: T, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match src.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

// Deliver output still queued after exit. Stops at disconnect, or once no
// chunk arrives within `grace`.
fn drain(rx: &Receiver<(Stream, Vec<u8>)>, on_output: &mut OutputFn<'_>, grace: Duration) {
    loop {
        match rx.recv_timeout(grace) {
            Ok((stream, chunk)) => on_output(stream, &chunk[..]),
            Err(RecvTimeoutError::Timeout) => {
                trace!("output pipes still open after exit, detaching readers");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        trace!(error = %e, "kill failed, process already gone");
    }
    if let Err(e) = child.wait() {
        trace!(error = %e, "could not reap killed process");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        pub argv: Vec<String>,
        pub timeout: Option<Duration>,
        pub idle_timeout: Option<Duration>,
    }

    /// Plays back canned outcomes, one per run, and records every request.
    #[derive(Debug, Default)]
    pub struct Scripted {
        outcomes: RefCell<VecDeque<Result<ExecResult, RunError>>>,
        output: Vec<(Stream, Vec<u8>)>,
        calls: RefCell<Vec<Call>>,
    }

    impl Scripted {
        pub fn new(outcomes: Vec<Result<ExecResult, RunError>>) -> Self {
            Scripted { outcomes: RefCell::new(outcomes.into()), ..Default::default() }
        }

        pub fn exit(code: i32) -> Result<ExecResult, RunError> {
            Ok(ExecResult { status: Some(code), success: code == 0 })
        }

        pub fn with_output(mut self, output: Vec<(Stream, Vec<u8>)>) -> Self {
            self.output = output;
            self
        }

        pub fn calls(&self) -> Vec<Call> { self.calls.borrow().clone() }
    }

    impl Runner for Scripted {
        fn run(
            &self,
            req: &RunRequest<'_>,
            on_output: &mut OutputFn<'_>,
        ) -> Result<ExecResult, RunError> {
            self.calls.borrow_mut().push(Call {
                argv: req.argv.to_vec(),
                timeout: req.timeout,
                idle_timeout: req.idle_timeout,
            });
            for (stream, chunk) in &self.output {
                on_output(*stream, chunk.as_slice());
            }
            self.outcomes.borrow_mut().pop_front().unwrap_or_else(|| Scripted::exit(0))
        }
    }
}
