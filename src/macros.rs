//! Terse macros for everyday usage

/// Build a [`CommandSpec`](crate::cmd::CommandSpec).
///
/// ```
/// let spec = shellspec::sx_cmd!("ping", args: ["host"], opts: ["-c= : count", "-i= : interval"]);
/// assert_eq!(spec.options.len(), 2);
/// ```
#[macro_export]
macro_rules! sx_cmd {
    ($prog:expr) => {{
        $crate::cmd::CommandSpec::new($prog)
    }};
    ($prog:expr, args: [ $( $a:expr ),* $(,)? ]) => {{
        $crate::sx_cmd!($prog, args: [ $( $a ),* ], opts: [])
    }};
    ($prog:expr, opts: [ $( $o:expr ),* $(,)? ]) => {{
        $crate::sx_cmd!($prog, args: [], opts: [ $( $o ),* ])
    }};
    ($prog:expr, args: [ $( $a:expr ),* $(,)? ], opts: [ $( $o:expr ),* $(,)? ]) => {{
        #[allow(unused_mut)]
        let mut __s = $crate::cmd::CommandSpec::new($prog);
        $( __s = __s.argument($a); )*
        $( __s = __s.option($o); )*
        __s
    }};
}
