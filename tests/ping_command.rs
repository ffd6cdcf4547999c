use std::cell::RefCell;
use std::time::{Duration, Instant};

use shellspec::prelude::*;

const OPTION_COUNT: &str = "-c= : count";
const OPTION_INTERVAL: &str = "-i= : interval";

/// A thin consumer in the shape applications build on top of `Command`.
struct Ping<R: Runner = StdRunner> {
    cmd: Command<R>,
}

impl<R: Runner> Ping<R> {
    fn with_runner(runner: R) -> shellspec::Result<Self> {
        let spec =
            shellspec::sx_cmd!("ping", args: ["host"], opts: [OPTION_COUNT, OPTION_INTERVAL]);
        Ok(Ping { cmd: Command::with_runner(spec, runner)? })
    }

    fn count(&mut self, count: Option<u32>, remove: bool) -> shellspec::Result<&mut Self> {
        self.cmd.update_option(OPTION_COUNT, true, count.map(Value::from), remove)?;
        Ok(self)
    }

    fn interval(&mut self, secs: f64) -> shellspec::Result<&mut Self> {
        self.cmd.update_option(OPTION_INTERVAL, true, Some(secs.into()), false)?;
        Ok(self)
    }

    fn host(&mut self, host: &str) -> &mut Self {
        self.cmd.update_argument("host", host);
        self
    }
}

/// Records argv and replies from a fixed list of exit codes.
#[derive(Default)]
struct Recorder {
    codes: RefCell<Vec<i32>>,
    seen: RefCell<Vec<Vec<String>>>,
}

impl Runner for Recorder {
    fn run(
        &self,
        req: &RunRequest<'_>,
        on_output: &mut OutputFn<'_>,
    ) -> Result<ExecResult, RunError> {
        self.seen.borrow_mut().push(req.argv.to_vec());
        on_output(Stream::Stdout, &b"PING\n"[..]);
        let mut codes = self.codes.borrow_mut();
        let code = if codes.is_empty() { 0 } else { codes.remove(0) };
        Ok(ExecResult { status: Some(code), success: code == 0 })
    }
}

#[test]
fn ping_compiles_options_before_host() {
    let mut ping = Ping::with_runner(Recorder::default()).unwrap();
    ping.count(Some(1), false).unwrap().interval(0.5).unwrap().host("127.0.0.1");
    assert_eq!(ping.cmd.compile(), vec!["ping", "-c", "1", "-i", "0.5", "127.0.0.1"]);

    ping.count(None, true).unwrap();
    assert_eq!(ping.cmd.compile(), vec!["ping", "-i", "0.5", "127.0.0.1"]);
}

#[test]
fn ping_retries_with_recorded_argv() {
    let runner = Recorder { codes: RefCell::new(vec![1, 0]), ..Default::default() };
    let mut ping = Ping::with_runner(&runner).unwrap();
    ping.cmd.set_retry_limit(Some(2)).unwrap();
    ping.count(Some(2), false).unwrap().host("example.org");

    let mut out = Vec::new();
    let mut cb = |_: Stream, chunk: &[u8]| out.extend_from_slice(chunk);
    let results: Vec<bool> = ping.cmd.run_multi(None, Some(&mut cb)).unwrap().collect();
    assert_eq!(results, vec![false, true]);
    assert_eq!(ping.cmd.retry_count(), 2);
    assert_eq!(out, b"PING\nPING\n");
    assert_eq!(runner.seen.borrow().len(), 2);
    assert_eq!(runner.seen.borrow()[0], vec!["ping", "-c", "2", "example.org"]);
}

#[cfg(unix)]
mod real_process {
    use super::*;

    fn sleeper(secs: &str) -> Command {
        let spec = CommandSpec::new("sleep").argument("secs");
        let mut cmd = Command::new(spec).unwrap();
        cmd.update_argument("secs", secs);
        cmd
    }

    #[test]
    fn command_times_out() {
        let mut cmd = sleeper("5");
        cmd.set_command_timeout(Some(Duration::from_millis(200)));
        assert!(!cmd.run_once(None, None).unwrap());
        assert!(cmd.last_error().unwrap().is_timeout());
    }

    #[test]
    fn command_does_not_time_out() {
        let mut cmd = sleeper("0");
        assert!(cmd.run_once(None, None).unwrap());
        assert!(cmd.last_error().is_none());
    }

    #[test]
    fn command_times_out_from_being_idle() {
        let mut cmd = sleeper("5");
        assert!(!cmd.run_once(Some(Duration::from_millis(200)), None).unwrap());
        assert!(cmd.last_error().unwrap().is_idle_timeout());
    }

    #[test]
    fn failed_attempts_are_retried() {
        let mut cmd = sleeper("5");
        cmd.set_command_timeout(Some(Duration::from_millis(100)));
        cmd.set_retry_limit(Some(2)).unwrap();
        for ok in cmd.run_multi(None, None).unwrap() {
            assert!(!ok);
        }
        assert_eq!(cmd.retry_count(), 2);
    }

    #[test]
    fn background_child_does_not_hold_up_exit() {
        let spec = CommandSpec::new("sh").argument("flag").argument("script");
        let mut cmd = Command::new(spec).unwrap();
        cmd.update_argument("flag", "-c").update_argument("script", "sleep 5 & exit 0");
        cmd.set_command_timeout(Some(Duration::from_millis(1500)));

        let started = Instant::now();
        assert!(cmd.run_once(None, None).unwrap());
        assert!(cmd.last_error().is_none());
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[test]
    fn missing_program_is_captured() {
        let mut cmd = Command::new(CommandSpec::new("/no/such/program-here")).unwrap();
        assert!(!cmd.run_once(None, None).unwrap());
        assert!(matches!(cmd.last_error(), Some(RunError::Spawn { .. })));
    }
}
