//! Rendering strategies for compiled argument vectors.

use std::time::Duration;

pub trait Renderer {
    /// Render `argv` (program first) as a single shell-escaped line.
    fn render_argv(&self, argv: &[String]) -> String;

    /// The command line followed by its run settings as a trailing comment.
    fn render_plan(
        &self,
        argv: &[String],
        timeout: Option<Duration>,
        retry_limit: Option<u32>,
    ) -> String {
        let mut s = self.render_argv(argv);
        let mut metas = Vec::new();
        if let Some(t) = timeout { metas.push(format!("timeout={}ms", t.as_millis())); }
        match retry_limit {
            Some(n) => metas.push(format!("retries={}", n)),
            None => metas.push("retries=unbounded".to_string()),
        }
        s.push_str(&format!("  # {}", metas.join(", ")));
        s
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PosixRenderer;

impl Renderer for PosixRenderer {
    fn render_argv(&self, argv: &[String]) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(argv.len());
        if let Some((program, args)) = argv.split_first() {
            parts.push(quote_prog(program));
            for a in args { parts.push(quote_sh(a)); }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WinRenderer;

impl Renderer for WinRenderer {
    fn render_argv(&self, argv: &[String]) -> String {
        argv.iter().map(|a| quote_win(a)).collect::<Vec<_>>().join(" ")
    }
}

/// Renderer for the shell of the current platform.
#[cfg(not(windows))]
pub fn platform() -> PosixRenderer { PosixRenderer }

#[cfg(windows)]
pub fn platform() -> WinRenderer { WinRenderer }

fn quote_prog(p: &str) -> String {
    // Allow bare if simple, else quote
    if is_simple_word(p) { p.to_string() } else { quote_sh(p) }
}

fn is_simple_word(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '/' | ':' | '+' | '%' | '@' | '=' | ',')
        })
}

fn quote_sh(s: &str) -> String {
    if s.is_empty() { return "''".to_string(); }
    let escaped = s.replace('\'', "'\"'\"'");
    format!("'{}'", escaped)
}

fn is_simple_word_win(s: &str) -> bool {
    // Avoid quoting if no spaces or metacharacters typical to cmd.exe
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '/' | '\\' | ':' | '+' | '%' | '@' | '=' | ',')
        })
}

fn quote_win(s: &str) -> String {
    if is_simple_word_win(s) { return s.to_string(); }
    let escaped = s.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> { parts.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn quote_sh_basic() {
        assert_eq!(quote_sh(""), "''");
        assert_eq!(quote_sh("hello"), "'hello'");
        assert_eq!(quote_sh("hello world"), "'hello world'");
        assert_eq!(quote_sh("foo'bar"), "'foo'\"'\"'bar'");
    }

    #[test]
    fn posix_argv() {
        let r = PosixRenderer;
        let got = r.render_argv(&argv(&["ping", "-c", "1", "127.0.0.1"]));
        assert_eq!(got, "ping '-c' '1' '127.0.0.1'");
        assert_eq!(r.render_argv(&argv(&["/opt/my tool/run", ""])), "'/opt/my tool/run' ''");
        assert_eq!(r.render_argv(&[]), "");
    }

    #[test]
    fn win_argv() {
        let r = WinRenderer;
        let parts = ["C:\\Program Files\\app.exe", "hello world", "a\"b", "-v"];
        let got = r.render_argv(&argv(&parts));
        assert_eq!(got, "\"C:\\Program Files\\app.exe\" \"hello world\" \"a\"\"b\" -v");
    }

    #[test]
    fn plan_metadata() {
        let r = PosixRenderer;
        let got = r.render_plan(&argv(&["sleep", "5"]), Some(Duration::from_millis(500)), Some(2));
        assert_eq!(got, "sleep '5'  # timeout=500ms, retries=2");
        let got = r.render_plan(&argv(&["sleep", "5"]), None, None);
        assert_eq!(got, "sleep '5'  # retries=unbounded");
    }
}
