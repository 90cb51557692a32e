use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Arguments for `hd completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate a shell completion script into `w`.
pub fn run_completions(shell: Shell, command: &mut clap::Command, w: &mut dyn Write) {
    generate(shell, command, "hd", w);
}
