//! Human-readable rendering of an argument vector.

use std::borrow::Cow;
use std::path::Path;

/// Quote one argument for a POSIX shell when needed.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

/// Render `program args...` as one copy-pasteable line.
pub fn render_command(program: &Path, args: &[String]) -> String {
    let program = program.display().to_string();
    std::iter::once(shell_quote(&program).into_owned())
        .chain(args.iter().map(|a| shell_quote(a).into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}
