//! Shell completion scripts

use clap::Command;
use clap_complete::{generate, Shell};
use std::io::{self, Write};

/// Write the completion script for `shell` to `out`
pub fn write_completions(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, out);
}

/// Print the completion script for `shell` to stdout
pub fn print_completions(shell: Shell, cmd: &mut Command) {
    write_completions(shell, cmd, &mut io::stdout());
}
