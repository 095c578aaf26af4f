//! Shell-style command line construction.
//!
//! The local store is invoked with a single command-line string, not an
//! argument vector. How arguments are quoted into that string depends on the
//! runtime the store was built against, so the quoting rules sit behind the
//! [`ArgumentEscaper`] trait. [`CygwinEscaper`] implements the Cygwin
//! dialect, which is what a Windows build of the local store expects.

use std::borrow::Cow;

/// Converts between argument lists and command-line strings for one quoting
/// dialect.
pub trait ArgumentEscaper: Send + Sync {
    /// Joins `args` into one command line, quoting where needed.
    fn to_command_line(&self, args: &[String]) -> String;

    /// Splits a command line produced by [`to_command_line`](Self::to_command_line)
    /// back into its arguments.
    ///
    /// Empty arguments are emitted unquoted by the join, so they do not
    /// survive the round trip.
    fn split_command_line(&self, command_line: &str) -> Vec<String>;
}

/// Cygwin-style quoting.
///
/// An argument without spaces, double quotes or backslashes is emitted as
/// is. Anything else has its backslashes doubled, then its double quotes
/// escaped with a backslash, and is wrapped in double quotes. The order
/// matters: doubling after escaping would double the escape backslashes too.
#[derive(Debug, Clone, Copy, Default)]
pub struct CygwinEscaper;

impl ArgumentEscaper for CygwinEscaper {
    fn to_command_line(&self, args: &[String]) -> String {
        to_command_line(args)
    }

    fn split_command_line(&self, command_line: &str) -> Vec<String> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut in_token = false;
        let mut quoted = false;
        let mut chars = command_line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    quoted = !quoted;
                    in_token = true;
                }
                '\\' if quoted => match chars.peek() {
                    Some(&next @ ('\\' | '"')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                ' ' if !quoted => {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            }
        }

        if in_token {
            args.push(current);
        }
        args
    }
}

/// Joins arguments into a Cygwin-quoted command line separated by single
/// spaces.
pub fn to_command_line<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| prepare_argument(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes a single argument for a Cygwin command line.
pub fn prepare_argument(argument: &str) -> Cow<'_, str> {
    if !argument.contains([' ', '"', '\\']) {
        return Cow::Borrowed(argument);
    }

    let escaped = argument.replace('\\', "\\\\").replace('"', "\\\"");
    Cow::Owned(format!("\"{escaped}\""))
}
